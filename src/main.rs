use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use toolkit_agent::config::Config;
use toolkit_agent::gateway::ConnectionClient;
use toolkit_agent::message::Part;
use toolkit_agent::session::{AgentSession, TurnState};
use toolkit_agent::tools::{builtin, ToolRegistry};

fn print_help() {
    println!(
        "\
toolkit-agent v{}

Interactive chat client for a tool-augmented agent gateway.

USAGE:
    toolkit-agent [OPTIONS] [CONFIG_PATH]

ARGUMENTS:
    CONFIG_PATH    Path to TOML configuration file [default: config/agent.toml]

OPTIONS:
    -h, --help       Print this help message and exit
    -V, --version    Print version and exit

ENVIRONMENT VARIABLES:
    Variables are referenced in the config file via ${{VAR_NAME}} syntax.

    RUST_LOG         Log level filter for tracing
                     (e.g. debug, toolkit_agent=debug,warn)
    TOOLKIT_URL      Gateway base URL, typically referenced as
                     base_url = \"${{TOOLKIT_URL}}\" in the config

EXAMPLES:
    toolkit-agent                        # uses config/agent.toml
    toolkit-agent /etc/toolkit/agent.toml
    RUST_LOG=debug toolkit-agent",
        env!("CARGO_PKG_VERSION"),
    );
}

fn print_commands() {
    println!(
        "\
Commands:
  /connections  — List toolkit connections on the gateway
  /tools        — List locally registered tools
  /status       — Session state and gateway info
  /help         — This message
  /quit         — Exit"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --help / --version before anything else
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("toolkit-agent v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {}
        }
    }

    // Initialize logging (RUST_LOG=debug for debug mode)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("toolkit_agent=info")),
        )
        .init();

    // Load configuration; a missing default file falls back to defaults
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/agent.toml".to_string());

    let config = if std::path::Path::new(&config_path).exists() {
        info!("Loading configuration from {config_path}");
        Config::load(&config_path)?
    } else {
        info!("No config file at {config_path}, using defaults");
        Config::default()
    };

    info!("Agent: {}", config.agent.name);
    info!("Gateway: {}", config.gateway.base_url);

    let mut registry = ToolRegistry::new();
    registry.register("local_time", builtin::local_time());
    info!("Tools: {} registered", registry.len());

    let connections = ConnectionClient::new(&config.gateway);
    let mut session = AgentSession::new(&config.gateway, registry);

    println!("{} — type a message, /help for commands.", config.agent.name);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Slash commands are intercepted before the gateway
        if let Some(command) = line.strip_prefix('/') {
            match command.split_whitespace().next().unwrap_or_default() {
                "quit" | "exit" => break,
                "help" => print_commands(),
                "tools" => {
                    for name in session_tool_names(&session) {
                        println!("  {name}");
                    }
                }
                "status" => {
                    println!(
                        "State: {:?}\nMessages: {}\nGateway: {}",
                        session.state(),
                        session.messages().len(),
                        config.gateway.base_url,
                    );
                }
                "connections" => match connections.list().await {
                    Ok(list) if list.is_empty() => println!("No connections."),
                    Ok(list) => {
                        for c in list {
                            println!("  {} — {:?} ({})", c.toolkit, c.status, c.id);
                        }
                    }
                    Err(e) => println!("Cannot list connections: {e}"),
                },
                other => println!("Unknown command: /{other} (try /help)"),
            }
            continue;
        }

        let before = session.messages().len();
        match session.send(line).await {
            // Skip the user message we just echoed ourselves
            Ok(()) => print_new_messages(&session, before + 1),
            Err(e) => println!("Turn failed: {e}"),
        }
        if session.state() == TurnState::ToolCallsPending {
            println!("(waiting on external tool results)");
        }
    }

    Ok(())
}

/// Prints the assistant output added since `from`, in normalized form.
fn print_new_messages(session: &AgentSession, from: usize) {
    for message in &session.view()[from..] {
        for part in &message.parts {
            match part {
                Part::Text { text } => {
                    if !text.is_empty() {
                        println!("{text}");
                    }
                }
                Part::ToolInvocation {
                    tool_name, output, ..
                } => match output {
                    Some(output) => println!("[{tool_name}] {output}"),
                    None => println!("[{tool_name}] pending"),
                },
            }
        }
    }
}

fn session_tool_names(session: &AgentSession) -> Vec<String> {
    let manifest = session.manifest();
    manifest
        .as_object()
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default()
}
