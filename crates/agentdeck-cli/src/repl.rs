use agentdeck_session::{CancelHandle, ChatSession, SessionUpdate};
use agentdeck_types::{Message, Role};
use anyhow::Result;
use std::future::Future;
use std::io::Write;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

use crate::commands::{parse_command, Command, HELP};
use crate::config::PlaygroundConfig;

/// Interactive loop: reads commands from stdin until `/quit`, EOF or an
/// idle Ctrl-C.
pub async fn run(mut session: ChatSession, playground: &PlaygroundConfig) -> Result<()> {
    let mut renderer = Renderer::new(session.subscribe());

    let quit = Arc::new(Notify::new());
    tokio::spawn(watch_ctrl_c(session.cancel_handle(), Arc::clone(&quit)));

    let mut lines = spawn_stdin_reader();

    println!("agentdeck playground. Type /help for commands.");
    if let Some(agent) = session.agent() {
        println!("Using agent {}", agent);
    }

    loop {
        print_prompt(&session);

        let line = tokio::select! {
            _ = quit.notified() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else { break };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let flow = execute(&mut session, &mut renderer, command, playground).await;
        renderer.drain();
        match flow {
            Ok(ControlFlow::Continue(())) => {}
            Ok(ControlFlow::Break(())) => break,
            Err(e) => println!("Error: {:#}", e),
        }
    }

    session.flush().await;

    Ok(())
}

async fn execute(
    session: &mut ChatSession,
    renderer: &mut Renderer,
    command: Command,
    playground: &PlaygroundConfig,
) -> Result<ControlFlow<()>> {
    match command {
        Command::Prompt(text) => {
            let outcome = renderer.follow(session.send(&text)).await?;
            tracing::debug!(?outcome, "Prompt handled");
        }
        Command::Agents => {
            let agents = session.list_agents().await?;
            if agents.is_empty() {
                println!("No agents configured");
            }
            for agent in agents {
                let marker = if session.agent() == Some(agent.name.as_str()) { "*" } else { " " };
                match agent.description {
                    Some(description) => println!("{} {} - {}", marker, agent.name, description),
                    None => println!("{} {}", marker, agent.name),
                }
            }
        }
        Command::Agent(name) => {
            let definition = session.select_agent(&name).await?;
            println!("Using agent {}", definition.name);
            if let Some(model) = definition.model {
                println!("  model: {}", model);
            }
        }
        Command::History { page } => {
            let page = session.open_history(page, playground.history_page_size).await;
            if page.items.is_empty() {
                println!("No saved conversations");
            }
            for item in &page.items {
                let updated = item
                    .updated_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "  {}  {:<16}  {}  {}",
                    item.conversation_id,
                    item.agent_name,
                    updated,
                    item.title.as_deref().unwrap_or("(untitled)")
                );
            }
            println!(
                "Page {} of {} ({} total)",
                page.pagination.page,
                page.pagination.total_pages.max(1),
                page.pagination.total
            );
            if page.has_next() {
                println!("Next: /history {}", page.pagination.page + 1);
            }
        }
        Command::Open(id) => {
            session.load_conversation(&id).await?;
            println!("Loaded {}", id);
            print_transcript(session.messages());
            if !session.uploaded_files().is_empty() {
                println!("Uploaded files: {}", session.uploaded_files().join(", "));
            }
        }
        Command::Delete(id) => {
            if session.delete_conversation(&id).await? {
                println!("Deleted {}", id);
            } else {
                println!("Could not delete {}", id);
            }
        }
        Command::New => {
            session.new_conversation()?;
            println!("Started a new conversation");
        }
        Command::Upload { collection, files } => {
            let names = session.upload_files(&collection, &files).await?;
            println!("Uploaded to {}: {}", collection, names.join(", "));
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(ControlFlow::Break(())),
    }

    Ok(ControlFlow::Continue(()))
}

/// Ctrl-C cancels the in-flight run; with nothing running it asks the loop
/// to quit.
async fn watch_ctrl_c(cancel: CancelHandle, quit: Arc<Notify>) {
    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl-C handler unavailable: {}", e);
            return;
        }
        if cancel.cancel() {
            tracing::debug!("Cancel requested");
        } else {
            quit.notify_one();
        }
    }
}

/// Blocking stdin reads live on their own thread so shutdown never waits
/// on a pending read.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    rx
}

/// Prints session updates as they arrive. Runs on the loop's own task so
/// streamed text and command output never interleave.
struct Renderer {
    updates: mpsc::UnboundedReceiver<SessionUpdate>,
    mid_line: bool,
}

impl Renderer {
    fn new(updates: mpsc::UnboundedReceiver<SessionUpdate>) -> Self {
        Self {
            updates,
            mid_line: false,
        }
    }

    /// Await `task` while rendering whatever it produces
    async fn follow<F: Future>(&mut self, task: F) -> F::Output {
        tokio::pin!(task);
        loop {
            tokio::select! {
                output = &mut task => {
                    self.drain();
                    return output;
                }
                Some(update) = self.updates.recv() => self.render(update),
            }
        }
    }

    fn drain(&mut self) {
        while let Ok(update) = self.updates.try_recv() {
            self.render(update);
        }
    }

    fn render(&mut self, update: SessionUpdate) {
        match update {
            SessionUpdate::MessageAppended(message) => match message.role {
                Role::User => {}
                Role::Agent => {
                    print!("agent> ");
                    self.mid_line = true;
                }
                Role::System => {
                    self.end_line();
                    println!("[{}]", message.content);
                }
            },
            SessionUpdate::ChunkAppended { content, .. } => {
                print!("{}", content);
                self.mid_line = true;
            }
            SessionUpdate::MessageFinished { .. }
            | SessionUpdate::MessageRemoved { .. }
            | SessionUpdate::RunFinished(_) => self.end_line(),
            SessionUpdate::ConversationLoaded { .. } | SessionUpdate::ConversationCleared => {}
        }
        let _ = std::io::stdout().flush();
    }

    fn end_line(&mut self) {
        if self.mid_line {
            println!();
            self.mid_line = false;
        }
    }
}

fn print_prompt(session: &ChatSession) {
    let agent = session.agent().unwrap_or("no agent");
    print!("[{}] > ", agent);
    let _ = std::io::stdout().flush();
}

fn print_transcript(messages: &[Message]) {
    for message in messages {
        println!("{}> {}", message.role, message.content);
    }
}
