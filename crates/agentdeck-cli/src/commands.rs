use anyhow::{bail, Result};
use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  <text>                          send a prompt to the current agent
  /agents                         list agents
  /agent <name>                   switch agent
  /history [page]                 list saved conversations
  /open <conversation_id>         load a conversation
  /delete <conversation_id>       delete a conversation
  /new                            start a new conversation
  /upload <collection> <file...>  upload files to a knowledge collection
  /help                           show this help
  /quit                           exit
Press Ctrl-C while the agent is replying to cancel the run.";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Prompt(String),
    Agents,
    Agent(String),
    History { page: u32 },
    Open(String),
    Delete(String),
    New,
    Upload { collection: String, files: Vec<PathBuf> },
    Help,
    Quit,
}

/// Parse a line. Blank lines yield None.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if !line.starts_with('/') {
        return Ok(Some(Command::Prompt(line.to_string())));
    }

    let mut words = line.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let command = match (name, args.as_slice()) {
        ("/agents", []) => Command::Agents,
        ("/agent", [agent]) => Command::Agent(agent.to_string()),
        ("/agent", _) => bail!("Usage: /agent <name>"),
        ("/history", []) => Command::History { page: 1 },
        ("/history", [page]) => match page.parse::<u32>() {
            Ok(page) if page > 0 => Command::History { page },
            _ => bail!("Page must be a positive number, got '{}'", page),
        },
        ("/history", _) => bail!("Usage: /history [page]"),
        ("/open", [id]) => Command::Open(id.to_string()),
        ("/open", _) => bail!("Usage: /open <conversation_id>"),
        ("/delete", [id]) => Command::Delete(id.to_string()),
        ("/delete", _) => bail!("Usage: /delete <conversation_id>"),
        ("/new", []) => Command::New,
        ("/upload", [collection, files @ ..]) if !files.is_empty() => Command::Upload {
            collection: collection.to_string(),
            files: files.iter().map(PathBuf::from).collect(),
        },
        ("/upload", _) => bail!("Usage: /upload <collection> <file...>"),
        ("/help", _) => Command::Help,
        ("/quit", []) | ("/exit", []) => Command::Quit,
        _ => bail!("Unknown command '{}', try /help", line),
    };

    Ok(Some(command))
}
