mod config;
mod console;
mod demo;
mod terminal_output;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use discore_commands::{
    Actor, CapabilitySet, CommandDispatcher, DispatcherSettings, IncomingMessage, Permission,
    RoleId,
};
use discore_config::{apply_all_defaults, config_dir, config_file_path, ensure_valid, load_config};
use discore_logging::init_logger;

use config::{describe_limit, dispatcher_settings};
use console::ConsoleTransport;
use terminal_output::{render_table, supports_color};

/// Inbound messages buffered between stdin and the dispatcher.
const INBOX_CAPACITY: usize = 64;

#[derive(Parser)]
#[command(name = "discore")]
#[command(about = "discore: prefix-command bot core, driven from the console")]
#[command(version)]
struct Cli {
    /// Config file (defaults to `$DISCORE_CONFIG_DIR/config.yaml`)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read messages from stdin and dispatch them as the console user
    Run {
        /// Override the configured command prefix
        #[arg(short, long)]
        prefix: Option<String>,
        /// Extra permissions for the console user, e.g. `manage_messages`
        #[arg(short, long = "grant", value_delimiter = ',')]
        grants: Vec<String>,
        /// Role ids held by the console user
        #[arg(short, long = "role", value_delimiter = ',')]
        roles: Vec<u64>,
    },
    /// Print the visible command list
    Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let config = apply_all_defaults(load_config(&path).await?);
    init_logger(config.log_level(), config.log_dir())?;
    ensure_valid(&config, &path)?;

    match cli.command {
        Commands::Run {
            prefix,
            grants,
            roles,
        } => {
            let settings = dispatcher_settings(&config, prefix.as_deref());
            let author = console_user(&grants, &roles);
            run_console(settings, author).await?;
        }
        Commands::Commands => {
            let settings = dispatcher_settings(&config, None);
            let transport = Arc::new(ConsoleTransport::new(std::io::sink(), false));
            let registry = demo::build_registry(transport)?;
            let rows: Vec<Vec<String>> = registry
                .list_visible()
                .map(|d| {
                    vec![
                        format!("{}{}", settings.prefix, d.display_usage()),
                        d.aliases()[1..].join(", "),
                        d.permission().to_string(),
                        d.description().to_string(),
                    ]
                })
                .collect();
            print!(
                "{}",
                render_table(&["Usage", "Aliases", "Permission", "Description"], &rows)
            );
        }
    }

    Ok(())
}

/// The console user always holds the default permission plus any grants.
fn console_user(grants: &[String], roles: &[u64]) -> Actor {
    let mut capabilities = CapabilitySet::new()
        .with(Permission::READ_MESSAGES)
        .with(Permission::SEND_MESSAGES);
    for grant in grants {
        capabilities.insert(Permission::new(grant.trim().to_lowercase()));
    }
    Actor::new("console", capabilities).with_roles(roles.iter().copied().map(RoleId))
}

async fn run_console(settings: DispatcherSettings, author: Actor) -> Result<()> {
    info!(
        prefix = %settings.prefix,
        timeout = %describe_limit(settings.handler_timeout),
        notice_ttl = %describe_limit(settings.notice_ttl),
        "Starting console bot"
    );

    let transport = Arc::new(ConsoleTransport::new(std::io::stdout(), supports_color()));
    let registry = demo::build_registry(transport.clone())?;
    let dispatcher = Arc::new(CommandDispatcher::new(registry, transport.clone(), settings));

    let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
    let worker = tokio::spawn(Arc::clone(&dispatcher).run(rx));

    let forwarded = forward_lines(
        BufReader::new(tokio::io::stdin()),
        &*transport,
        &author,
        &tx,
    )
    .await;

    // Closing the channel lets the loop drain in-flight dispatches and exit.
    drop(tx);
    worker.await?;
    info!("Console bot stopped");
    forwarded
}

/// Forward each non-blank input line to the dispatcher until EOF.
///
/// Invalid UTF-8 is decoded lossily so one bad line cannot stop the loop.
async fn forward_lines<R, W>(
    mut reader: R,
    transport: &ConsoleTransport<W>,
    author: &Actor,
    tx: &mpsc::Sender<IncomingMessage>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        if std::str::from_utf8(&buf).is_err() {
            warn!("Input line is not valid UTF-8; decoding lossily");
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        if tx.send(transport.incoming(line, author)).await.is_err() {
            warn!("Dispatcher stopped; dropping remaining input");
            return Ok(());
        }
    }
}
