//! Aalex listener: reads commands from stdin and speaks answers on stdout.
//!
//! Usage: `aalex [--home DIR] [listen | components | commands ...]`

use std::path::PathBuf;
use std::process::ExitCode;

use aalex::command::{ActionKind, CommandDefinition};
use aalex::platform::{default_effector, ConsoleSpeaker, StdinTranscriber};
use aalex::supervisor::spawn_poller;
use aalex::{load_or_create_config, resolve_home_dir, Assistant, CoreError, CoreResult};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aalex")]
#[command(about = "Voice-style command assistant and component launcher")]
struct Cli {
    /// Assistant home holding config.json and custom commands.
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the listener loop (default).
    Listen,
    /// Print the configured components.
    Components,
    /// Manage custom commands.
    #[command(subcommand)]
    Commands(CommandsAction),
}

#[derive(Subcommand)]
enum CommandsAction {
    /// List custom commands.
    List,
    /// Add or replace a custom command.
    Add {
        name: String,
        /// Trigger phrase; repeat for several.
        #[arg(long = "trigger", short, required = true)]
        triggers: Vec<String>,
        #[arg(long, short, default_value = "")]
        response: String,
        /// speak, effector or composite.
        #[arg(long, default_value = "speak")]
        action: String,
        /// JSON payload for effector and composite commands.
        #[arg(long)]
        payload: Option<String>,
    },
    /// Remove a custom command.
    Remove { name: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aalex=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CoreResult<()> {
    let home = cli.home.unwrap_or_else(resolve_home_dir);
    let config = load_or_create_config(&home)?;
    let mut assistant = Assistant::new(config, &home, default_effector())?;

    match cli.command.unwrap_or(Command::Listen) {
        Command::Listen => listen(&assistant).await,
        Command::Components => {
            for component in assistant.supervisor().components() {
                println!(
                    "{}\t{} {}\t{}",
                    component.id,
                    component.program,
                    component.args.join(" "),
                    component.description
                );
            }
            Ok(())
        }
        Command::Commands(CommandsAction::List) => {
            for definition in assistant.registry().custom_definitions() {
                println!(
                    "{}\t{}\t{}",
                    definition.name,
                    definition.action.as_str(),
                    definition.trigger_phrases.join(" | ")
                );
            }
            Ok(())
        }
        Command::Commands(CommandsAction::Add {
            name,
            triggers,
            response,
            action,
            payload,
        }) => {
            let action = parse_action(&action)?;
            let mut definition = CommandDefinition::new(name, triggers, action, response);
            if let Some(payload) = payload {
                let payload = serde_json::from_str(&payload).map_err(|error| {
                    CoreError::InvalidInput(format!("payload is not JSON: {error}"))
                })?;
                definition = definition.with_payload(payload);
            }
            let name = definition.name.clone();
            assistant.add_custom_command(definition)?;
            println!("saved {name}");
            Ok(())
        }
        Command::Commands(CommandsAction::Remove { name }) => {
            if assistant.remove_custom_command(&name)? {
                println!("removed {name}");
            } else {
                println!("no custom command named {name}");
            }
            Ok(())
        }
    }
}

async fn listen(assistant: &Assistant) -> CoreResult<()> {
    let supervisor = assistant.supervisor().clone();
    let poller = spawn_poller(
        supervisor.clone(),
        assistant.config().supervisor.poll_interval(),
    );
    let transcriber = StdinTranscriber::new();
    let speaker = ConsoleSpeaker::new(assistant.config().assistant_name.clone());

    let outcome = tokio::select! {
        outcome = assistant.run(&transcriber, &speaker) => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            Ok(())
        }
    };

    poller.abort();
    let forced = supervisor
        .stop_all(assistant.config().supervisor.grace_period())
        .await;
    if !forced.is_empty() {
        tracing::warn!("force stopped: {}", forced.into_iter().collect::<Vec<_>>().join(", "));
    }
    outcome
}

fn parse_action(action: &str) -> CoreResult<ActionKind> {
    match action {
        "speak" => Ok(ActionKind::Speak),
        "effector" => Ok(ActionKind::Effector),
        "composite" => Ok(ActionKind::Composite),
        other => Err(CoreError::InvalidInput(format!("unknown action {other}"))),
    }
}
