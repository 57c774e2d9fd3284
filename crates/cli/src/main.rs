use clap::{Parser, Subcommand};
use grit::twilio::{CallScript, TwilioClient};

#[derive(Parser)]
#[command(name = "grit")]
#[command(about = "Grit coaching bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: GRIT_CONFIG_PATH or ~/.grit/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the webhook gateway (/whatsapp, /voice, /call-response).
    Serve {
        /// Config file path (default: GRIT_CONFIG_PATH or ~/.grit/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config, PORT env, or 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Place the wake-up call now. Twilio fetches the script from <publicBaseUrl>/voice.
    Call {
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Number to call, e.g. +911234567890
        #[arg(long)]
        to: String,
    },

    /// Send a WhatsApp message from the configured sender.
    Send {
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Recipient number; the whatsapp: prefix is added when missing.
        #[arg(long)]
        to: String,

        #[arg(long)]
        body: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("grit {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Init { config }) => run_init(config),
        Some(Commands::Serve { config, port }) => run_serve(config, port).await,
        Some(Commands::Call { config, to }) => run_call(config, &to).await,
        Some(Commands::Send { config, to, body }) => run_send(config, &to, &body).await,
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };
    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(grit::config::default_config_path);
    let dir = grit::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = grit::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    let state = grit::gateway::GatewayState::from_config(config)?;
    grit::gateway::run_gateway(state).await
}

fn twilio_client(config: &grit::config::Config) -> anyhow::Result<TwilioClient> {
    TwilioClient::from_config(&config.twilio).ok_or_else(|| {
        anyhow::anyhow!("twilio not configured (set TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN)")
    })
}

async fn run_call(config_path: Option<std::path::PathBuf>, to: &str) -> anyhow::Result<()> {
    let (config, _) = grit::config::load_config(config_path)?;
    let base = config
        .twilio
        .public_base_url
        .as_deref()
        .map(|u| u.trim_end_matches('/').to_string())
        .ok_or_else(|| anyhow::anyhow!("publicBaseUrl not configured (set GRIT_PUBLIC_BASE_URL)"))?;
    let client = twilio_client(&config)?;
    let sid = client
        .place_call(to, &CallScript::Url(format!("{}/voice", base)))
        .await?;
    println!("call placed: {}", sid);
    Ok(())
}

async fn run_send(
    config_path: Option<std::path::PathBuf>,
    to: &str,
    body: &str,
) -> anyhow::Result<()> {
    let (config, _) = grit::config::load_config(config_path)?;
    let client = twilio_client(&config)?;
    let sid = client.send_whatsapp(to, body).await?;
    println!("message sent: {}", sid);
    Ok(())
}
