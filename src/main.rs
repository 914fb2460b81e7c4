use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use campus_config::CampusConfig;
use campus_host_http::HttpGateway;
use campus_host_kv::InMemorySecureStore;
use campus_host_log::{TracingAlerts, TracingDiagnostics};
use campus_host_push::InMemoryPush;
use campus_workflow::{Capabilities, ChannelNotifier, Notification, Trigger};
use campus_workflow_orchestrator::{Dispatcher, Settings};

/// Campus - authentication and messaging workflows from the command line
#[derive(Parser)]
#[command(name = "campus")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the config file (default: ~/.campus/config.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Log at debug level unless RUST_LOG is set
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Write logs to stderr as JSON
  #[arg(long, global = true)]
  log_json: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Log in against the identity provider
  Login {
    #[arg(long)]
    username: String,

    #[arg(long)]
    password: String,
  },

  /// List the broadcast topics
  Topics,

  /// Log in, then fetch a page of messages
  Messages {
    #[arg(long)]
    username: String,

    #[arg(long)]
    password: String,

    /// Page cursor from a previous page's nextTimestamp
    #[arg(long)]
    timestamp: Option<i64>,

    /// Append to the current list instead of replacing it
    #[arg(long)]
    more: bool,
  },

  /// Log in with a demo account, no network required
  Demo {
    /// Use the student demo account
    #[arg(long)]
    student: bool,

    /// Topics to subscribe to after logging in
    #[arg(long = "topic")]
    topics: Vec<String>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose, cli.log_json);

  let config = load_config(cli.config.as_deref())?;

  match cli.command {
    Some(command) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { run(command, config).await })
    }
    None => {
      println!("campus - use --help to see available commands");
      Ok(())
    }
  }
}

fn init_tracing(verbose: bool, json: bool) {
  let filter = if verbose { "debug" } else { "warn" };
  let registry = tracing_subscriber::registry().with(
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
  );

  // Notifications go to stdout, logs to stderr
  if json {
    registry
      .with(fmt::layer().json().with_writer(std::io::stderr))
      .init();
  } else {
    registry
      .with(fmt::layer().without_time().with_writer(std::io::stderr))
      .init();
  }
}

fn load_config(path: Option<&Path>) -> Result<CampusConfig> {
  let path = match path {
    Some(path) => path.to_path_buf(),
    None => match dirs::home_dir() {
      Some(home) => home.join(".campus").join("config.json"),
      None => {
        debug!("no home directory, using default config");
        return Ok(CampusConfig::default());
      }
    },
  };

  if !path.exists() {
    debug!(path = %path.display(), "config file not found, using defaults");
    return Ok(CampusConfig::default());
  }

  let content = std::fs::read_to_string(&path)
    .with_context(|| format!("failed to read config file: {}", path.display()))?;
  CampusConfig::from_json(&content)
    .with_context(|| format!("failed to parse config file: {}", path.display()))
}

async fn run(command: Commands, config: CampusConfig) -> Result<()> {
  let store = Arc::new(InMemorySecureStore::new());
  let gateway =
    HttpGateway::new(&config.endpoints, store.clone()).context("failed to create gateway")?;
  let capabilities = Capabilities::new(
    Arc::new(gateway),
    store,
    Arc::new(InMemoryPush::default()),
    Arc::new(TracingDiagnostics),
    Arc::new(TracingAlerts),
  );

  let (sender, receiver) = mpsc::unbounded_channel();
  let printer = tokio::spawn(print_notifications(receiver));
  let dispatcher = Dispatcher::new(
    capabilities,
    Settings::from(&config),
    Arc::new(ChannelNotifier::new(sender)),
  );

  match command {
    Commands::Login { username, password } => {
      run_trigger(&dispatcher, Trigger::UserLogin { username, password }).await?;
    }
    Commands::Topics => {
      run_trigger(&dispatcher, Trigger::GetTopics).await?;
    }
    Commands::Messages {
      username,
      password,
      timestamp,
      more,
    } => {
      run_trigger(&dispatcher, Trigger::UserLogin { username, password }).await?;
      if !dispatcher.session().is_logged_in {
        bail!("login failed, not fetching messages");
      }

      let trigger = if more {
        Trigger::LoadMoreMessages { timestamp }
      } else {
        Trigger::UpdateMessages { timestamp }
      };
      run_trigger(&dispatcher, trigger).await?;
    }
    Commands::Demo { student, topics } => {
      let account = if student { "studentdemo" } else { "demo" };
      run_trigger(
        &dispatcher,
        Trigger::UserLogin {
          username: account.to_string(),
          password: account.to_string(),
        },
      )
      .await?;

      // One at a time: each subscription reads the previous one's profile
      for topic_id in topics {
        run_trigger(&dispatcher, Trigger::SubscribeToTopic { topic_id }).await?;
      }
    }
  }

  // Closes the notification channel once the last execution is gone
  drop(dispatcher);
  printer.await.context("notification printer panicked")??;

  Ok(())
}

async fn run_trigger(dispatcher: &Dispatcher, trigger: Trigger) -> Result<()> {
  let kind = trigger.kind();
  dispatcher
    .trigger(trigger)
    .wait()
    .await
    .with_context(|| format!("{kind} execution failed"))?;
  info!(trigger = %kind, state = ?dispatcher.state(kind), "trigger finished");
  Ok(())
}

async fn print_notifications(mut receiver: mpsc::UnboundedReceiver<Notification>) -> Result<()> {
  while let Some(notification) = receiver.recv().await {
    println!("{}", serde_json::to_string(&notification)?);
  }
  Ok(())
}
