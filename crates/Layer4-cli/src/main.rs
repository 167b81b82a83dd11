//! Relay CLI - Main entry point

mod chat;
mod console;
mod threads;

use chat::ChatSession;
use clap::{Parser, Subcommand};
use console::ConsoleListener;
use relay_core::{CheckinPlugin, HookPoint, LoggingPlugin, PluginRegistry, ShellValidator};
use relay_delegation::{DelegationEngine, DelegationSupervisor};
use relay_foundation::event::system;
use relay_foundation::{DelegationStore, EventBus, EventBusConfig, RelayConfig, Storage};
use relay_provider::ProcessInvoker;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Relay - delegate tasks to sub-agents and iterate until they pass validation
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Continue an existing conversation thread
    #[arg(short, long)]
    thread: Option<String>,

    /// Default model for delegated tasks
    #[arg(long)]
    model: Option<String>,

    /// Default iteration limit for delegated tasks
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Data directory (holds relay.db)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Sub-agent command (prompt is written to its stdin)
    #[arg(long)]
    subagent: Option<String>,

    /// Shell command that validates sub-agent output (stdin = output, exit 0 = accept)
    #[arg(long)]
    validate: Option<String>,

    /// Print sub-agent output lines as they stream
    #[arg(long)]
    stream: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List recent threads
    Threads {
        /// Number of threads to show
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },
    /// Print the messages of a thread
    Show {
        /// Thread ID
        thread_id: String,
    },
    /// Print the effective configuration
    Config {
        /// Save it as the global config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging (stderr, stdout는 대화용)
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load configuration
    let mut config = RelayConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        RelayConfig::default()
    });
    apply_overrides(&mut config, &args);

    if let Some(Command::Config { save }) = &args.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        if *save {
            config.save_global()?;
            println!("Saved global config");
        }
        return Ok(());
    }

    let data_dir = config.resolve_data_dir()?;
    let store: Arc<dyn DelegationStore> = Arc::new(Storage::new(&data_dir)?);

    // Handle subcommands first
    if let Some(command) = &args.command {
        return match command {
            Command::Threads { limit } => threads::list_threads_cmd(store.as_ref(), *limit),
            Command::Show { thread_id } => threads::show_thread_cmd(store.as_ref(), thread_id),
            Command::Config { .. } => Ok(()),
        };
    }

    let bus = Arc::new(EventBus::with_config(EventBusConfig {
        history_size: config.event_history_size,
        ..Default::default()
    }));
    bus.subscribe(Arc::new(ConsoleListener::new(store.clone(), args.stream)))
        .await;

    let cwd = std::env::current_dir()?;

    let registry = Arc::new(PluginRegistry::new());
    registry.register(Arc::new(LoggingPlugin::new()));
    registry.register(Arc::new(CheckinPlugin::new()));
    if let Some(command) = &args.validate {
        let validator = ShellValidator::new(command.clone()).with_working_dir(&cwd);
        registry.register(Arc::new(validator));
        tracing::info!("Validating sub-agent output with: {}", command);
    }
    tracing::debug!(
        validators = ?registry.implementors(HookPoint::OnTaskComplete),
        commands = ?registry.implementors(HookPoint::OnCommand),
        "Plugins registered"
    );

    let invoker = Arc::new(
        ProcessInvoker::from_config(&config.subagent)?.with_working_dir(&cwd),
    );
    tracing::info!(
        "Sub-agent: {} (default model: {})",
        config.subagent.command,
        config.default_model
    );

    let engine = Arc::new(DelegationEngine::from_config(
        &config,
        store.clone(),
        invoker,
        bus.clone(),
    ));

    let session = ChatSession {
        store: store.clone(),
        bus: bus.clone(),
        registry,
        supervisor: DelegationSupervisor::new(engine),
    };
    let thread = session.open_thread(args.thread.as_deref())?;

    bus.publish(system::started(env!("CARGO_PKG_VERSION"))).await;
    session.run(&thread).await
}

/// CLI 플래그가 설정 파일보다 우선
fn apply_overrides(config: &mut RelayConfig, args: &Args) {
    if let Some(model) = &args.model {
        config.default_model = model.clone();
    }
    if let Some(max_iterations) = args.max_iterations {
        config.default_max_iterations = max_iterations;
    }
    if let Some(db) = &args.db {
        config.data_dir = Some(db.clone());
    }
    if let Some(subagent) = &args.subagent {
        config.subagent.command = subagent.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "relay",
            "--model",
            "opus",
            "--max-iterations",
            "3",
            "--subagent",
            "my-agent --quiet",
            "--db",
            "/tmp/relay-data",
        ]);
        let mut config = RelayConfig::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.default_model, "opus");
        assert_eq!(config.default_max_iterations, 3);
        assert_eq!(config.subagent.command, "my-agent --quiet");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/relay-data")));
    }

    #[test]
    fn test_subcommands_parse() {
        let args = Args::parse_from(["relay", "show", "abc"]);
        assert!(matches!(args.command, Some(Command::Show { thread_id }) if thread_id == "abc"));

        let args = Args::parse_from(["relay", "threads", "--limit", "3"]);
        assert!(matches!(args.command, Some(Command::Threads { limit: 3 })));

        let args = Args::parse_from(["relay", "config", "--save"]);
        assert!(matches!(args.command, Some(Command::Config { save: true })));
    }
}
