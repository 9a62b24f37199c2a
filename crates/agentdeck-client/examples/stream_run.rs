use agentdeck_client::{agent_event_stream, AgentRuntime, ClientConfig, HttpClient, RunRequest};
use agentdeck_types::AgentEvent;
use anyhow::Result;
use futures::StreamExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Runtime location and agent from environment variables
    let base_url =
        std::env::var("AGENTDECK_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
    let agent = std::env::var("AGENTDECK_AGENT").unwrap_or_else(|_| "assistant".to_string());
    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Say hello in one short sentence.".to_string());

    println!("Streaming Agent Run Example");
    println!("===========================\n");
    println!("Runtime: {}", base_url);
    println!("Agent: {}\n", agent);

    let mut config = ClientConfig::new(base_url);
    if let Ok(token) = std::env::var("AGENTDECK_TOKEN") {
        config = config.with_auth_token(token);
    }
    let client = HttpClient::new(&config)?;

    let conversation_id = std::env::var("AGENTDECK_CONVERSATION_ID")
        .unwrap_or_else(|_| "conv_example".to_string());
    let request = RunRequest::new(agent, prompt, conversation_id);

    println!("Streaming response:\n");
    println!("---");

    let body = client.run_stream(request).await?;
    let mut events = agent_event_stream(body);

    while let Some(event) = events.next().await {
        match event? {
            AgentEvent::Chunk { content } => {
                print!("{}", content);
                std::io::Write::flush(&mut std::io::stdout())?;
            }
            AgentEvent::Error { message } => {
                println!("\n[Error: {}]", message);
            }
            AgentEvent::RunComplete => {
                println!("\n---\n");
                break;
            }
            AgentEvent::Other { kind } => {
                println!("\n[Ignored event: {}]", kind);
            }
        }
    }

    println!("Run complete!");

    Ok(())
}
