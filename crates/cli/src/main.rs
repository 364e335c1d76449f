mod apply;
mod server;

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    pixbot_config::PixbotConfig,
    pixbot_dispatch::{
        Orchestrator, Services, Settings,
        local::{FsImageStorage, JsonDirResultLookup, MemoryWorkQueue},
        worker::{inbound_channel, run_inbound_worker, run_result_worker},
    },
    pixbot_telegram::{TelegramTransport, build_bot, start_polling},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "pixbot", about = "pixbot: image filters from photo captions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of pixbot.{toml,yaml,json}).
    #[arg(long, global = true, env = "PIXBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot: Telegram polling, workers and the HTTP health routes (default).
    Serve,
    /// Apply a caption to a local image and write the filtered PNG.
    Apply {
        /// Caption, e.g. "blur 8" or "rotate anti-clockwise 180".
        #[arg(short, long)]
        caption: String,
        /// Input image.
        image: PathBuf,
        /// Second image, joined onto the first by `concat`.
        second: Option<PathBuf>,
        /// Output path (default: `<stem>_filtered.png` next to the input).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the resolved configuration as TOML (token omitted).
    Config,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn services(config: &PixbotConfig, transport: TelegramTransport) -> Arc<Services> {
    Arc::new(Services {
        transport: Arc::new(transport),
        storage: Arc::new(FsImageStorage::new(&config.storage.root)),
        queue: Arc::new(MemoryWorkQueue::new()),
        lookup: Arc::new(JsonDirResultLookup::new(&config.results.dir)),
        settings: Settings::from(config),
    })
}

async fn serve(config: PixbotConfig, bind: String, port: u16) -> anyhow::Result<()> {
    let bot = build_bot(&config.telegram)?;
    let services = services(&config, TelegramTransport::new(bot.clone()));
    let orchestrator = Arc::new(Orchestrator::new(Arc::clone(&services)));
    let cancel = CancellationToken::new();
    let (tx, rx) = inbound_channel();

    let inbound = tokio::spawn(run_inbound_worker(
        Arc::clone(&orchestrator),
        rx,
        cancel.clone(),
    ));
    let results = tokio::spawn(run_result_worker(
        Arc::clone(&orchestrator),
        Arc::clone(&services.queue),
        config.queues.results.clone(),
        Duration::from_secs(config.queues.poll_wait_secs),
        cancel.clone(),
    ));
    let polling = start_polling(
        bot,
        config.telegram.poll_timeout_secs,
        tx.clone(),
        cancel.clone(),
    )
    .await?;

    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "http listener ready");

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                shutdown.cancel();
            },
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    let http_cancel = cancel.clone();
    axum::serve(listener, server::build_app(tx))
        .with_graceful_shutdown(async move { http_cancel.cancelled().await })
        .await?;

    for (name, handle) in [("inbound", inbound), ("results", results), ("polling", polling)] {
        if let Err(e) = handle.await {
            warn!(task = name, error = %e, "task ended abnormally");
        }
    }
    info!("pixbot stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "pixbot starting");

    let config = pixbot_config::discover_and_load(cli.config.as_deref())?;

    match cli.command {
        None | Some(Commands::Serve) => {
            let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
            let port = cli.port.unwrap_or(config.server.port);
            serve(config, bind, port).await
        },
        Some(Commands::Apply {
            caption,
            image,
            second,
            output,
        }) => {
            let out = apply::run(&caption, &image, second.as_deref(), output)?;
            println!("{}", out.display());
            Ok(())
        },
        Some(Commands::Config) => {
            let mut shown = config;
            shown.telegram.token = None;
            println!("{}", toml::to_string_pretty(&shown)?);
            Ok(())
        },
    }
}
