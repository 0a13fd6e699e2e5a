use clap::{Parser, Subcommand};
use lib::config::Config;
use lib::{ConversationSession, HttpDispatcher};
use std::path::PathBuf;

const GREETING: &str = "Hi 👋! Ask me anything about your emails.";

#[derive(Parser)]
#[command(name = "inbox-chat")]
#[command(about = "Ask questions about your mailbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by every command that talks to the backend.
#[derive(clap::Args, Clone)]
struct BackendArgs {
    /// Config file path (default: INBOX_CHAT_CONFIG_PATH or ~/.inbox-chat/config.json)
    #[arg(long, short, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Backend root or /chat endpoint (overrides config and INBOX_CHAT_BACKEND_URL)
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    /// Request deadline in milliseconds (overrides config and INBOX_CHAT_TIMEOUT_MS)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: INBOX_CHAT_CONFIG_PATH or ~/.inbox-chat/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Chat with the mail backend (interactive). Type /probe to test the connection, /exit to quit.
    Chat {
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Send a single query and print the reply.
    Ask {
        #[command(flatten)]
        backend: BackendArgs,

        /// The question to ask.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Check that the backend root answers with its status.
    Probe {
        #[command(flatten)]
        backend: BackendArgs,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("inbox-chat {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { backend }) => {
            if let Err(e) = run_chat(backend).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Ask { backend, query }) => {
            if let Err(e) = run_ask(backend, query.join(" ")).await {
                log::error!("ask failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Probe { backend }) => match run_probe(backend).await {
            Ok(true) => {}
            Ok(false) => std::process::exit(1),
            Err(e) => {
                log::error!("probe failed: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

/// Config file, then env, then command-line flags.
fn load_backend_config(args: BackendArgs) -> anyhow::Result<Config> {
    let (mut config, path) = lib::config::load_config(args.config)?;
    if let Some(url) = args.backend_url {
        config.backend.url = url;
    }
    if let Some(ms) = args.timeout_ms {
        config.backend.timeout_ms = ms;
    }
    log::debug!(
        "using config {} (backend {}, timeout {}ms)",
        path.display(),
        config.backend.chat_url(),
        config.backend.timeout_ms
    );
    Ok(config)
}

async fn run_chat(args: BackendArgs) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let config = load_backend_config(args)?;
    let session = ConversationSession::from_config(&config.backend);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("< {}", GREETING);
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim_end_matches(['\r', '\n']);
        let command = input.trim();
        if command.eq_ignore_ascii_case("/exit") || command.eq_ignore_ascii_case("/quit") {
            break;
        }
        if command.eq_ignore_ascii_case("/probe") {
            println!("{}", probe_report(&config).await.1);
            continue;
        }
        if command.is_empty() {
            continue;
        }

        println!("… searching emails");
        if let Some(reply) = session.submit(input).await {
            print_bot(reply.text());
        }
    }

    log::debug!("chat ended with {} messages", session.len());
    Ok(())
}

async fn run_ask(args: BackendArgs, query: String) -> anyhow::Result<()> {
    let config = load_backend_config(args)?;
    let session: ConversationSession<HttpDispatcher> =
        ConversationSession::from_config(&config.backend);
    match session.submit(&query).await {
        Some(reply) => print_bot(reply.text()),
        None => anyhow::bail!("query is empty"),
    }
    Ok(())
}

/// Prints the probe report; returns whether the backend answered.
async fn run_probe(args: BackendArgs) -> anyhow::Result<bool> {
    let config = load_backend_config(args)?;
    let (ok, report) = probe_report(&config).await;
    println!("{}", report);
    Ok(ok)
}

async fn probe_report(config: &Config) -> (bool, String) {
    let root = config.backend.probe_url();
    let result = lib::probe::probe_backend(&config.backend).await;
    (
        result.is_ok(),
        lib::probe::render_probe_report(&root, &result),
    )
}

fn print_bot(text: &str) {
    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        println!("< {}", first);
    }
    for line in lines {
        println!("  {}", line);
    }
}
