mod channel;
mod chunker;
mod config;
mod constants;
mod document;
mod error;
mod orchestrator;
mod platform;
mod retry;
mod stats;
mod traits;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use channel::{AdapterConfig, ChannelAdapter};
use config::{Credentials, DeliveryConfig, Tuning};
use constants::DEFAULT_IMAGE_DIR;
use document::{ExtractOptions, HeadingMode};
use error::AppError;
use orchestrator::{CaptionPolicy, Orchestrator};
use platform::{BotApiClient, Destination, Platform};
use retry::{MaxRetries, RetryPolicy};
use stats::build_stats_json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "docrelay",
    version,
    about = "Publish the sections of a Word document to Telegram and Bale channels"
)]
struct Args {
    /// Path to the .docx file (prompted for when omitted)
    document: Option<PathBuf>,

    /// Where to publish: T (Telegram), B (Bale) or A (all). Prompted for when omitted
    #[arg(short, long, env = "DOCRELAY_DESTINATION")]
    destination: Option<String>,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_API_TOKEN", hide_env_values = true)]
    telegram_token: Option<String>,

    /// Telegram channel or chat id
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    telegram_chat_id: Option<String>,

    /// Bale bot token
    #[arg(long, env = "BALE_API_TOKEN", hide_env_values = true)]
    bale_token: Option<String>,

    /// Bale channel or chat id
    #[arg(long, env = "BALE_CHAT_ID")]
    bale_chat_id: Option<String>,

    /// Telegram Bot API base URL
    #[arg(long, env = "DOCRELAY_TELEGRAM_API_BASE")]
    telegram_api_base: Option<String>,

    /// Bale Bot API base URL
    #[arg(long, env = "DOCRELAY_BALE_API_BASE")]
    bale_api_base: Option<String>,

    /// Delay between chunks of one text, in milliseconds [default: 1000]
    #[arg(long, env = "DOCRELAY_CHUNK_DELAY_MS")]
    chunk_delay_ms: Option<u64>,

    /// Delay between sections, in milliseconds [default: 1000]
    #[arg(long, env = "DOCRELAY_SECTION_DELAY_MS")]
    section_delay_ms: Option<u64>,

    /// Sections per batch [default: 5]
    #[arg(long, env = "DOCRELAY_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Extra delay between batches, in milliseconds [default: 1000]
    #[arg(long, env = "DOCRELAY_BATCH_DELAY_MS")]
    batch_delay_ms: Option<u64>,

    /// Resends allowed per rate-limited unit: a number or "unbounded" [default: unbounded]
    #[arg(long, env = "DOCRELAY_MAX_RETRIES")]
    max_retries: Option<MaxRetries>,

    /// Where a section's text goes when an image send does not deliver
    #[arg(long, value_enum, env = "DOCRELAY_CAPTION_POLICY")]
    caption_policy: Option<CaptionPolicy>,

    /// Override the Telegram message length limit
    #[arg(long, env = "DOCRELAY_TELEGRAM_MESSAGE_LIMIT")]
    telegram_message_limit: Option<usize>,

    /// Override the Bale message length limit
    #[arg(long, env = "DOCRELAY_BALE_MESSAGE_LIMIT")]
    bale_message_limit: Option<usize>,

    /// How sections are cut from the document
    #[arg(long, value_enum, default_value_t = HeadingMode::Heading4, env = "DOCRELAY_HEADING_MODE")]
    heading_mode: HeadingMode,

    /// Directory extracted images are written to
    #[arg(long, default_value = DEFAULT_IMAGE_DIR, env = "DOCRELAY_IMAGE_DIR")]
    image_dir: PathBuf,

    /// YAML file with delivery tuning; flags take precedence
    #[arg(long, env = "DOCRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "DOCRELAY_LOG_FORMAT")]
    log_format: LogFormat,
}

impl Args {
    fn tuning(&self) -> Tuning {
        Tuning {
            chunk_delay_ms: self.chunk_delay_ms,
            section_delay_ms: self.section_delay_ms,
            batch_size: self.batch_size,
            batch_delay_ms: self.batch_delay_ms,
            max_retries: self.max_retries,
            caption_policy: self.caption_policy,
            telegram_message_limit: self.telegram_message_limit,
            bale_message_limit: self.bale_message_limit,
        }
    }

    fn credentials(&self, platform: Platform) -> Result<Credentials, AppError> {
        match platform {
            Platform::Telegram => Credentials::require(
                platform,
                self.telegram_token.clone(),
                self.telegram_chat_id.clone(),
            ),
            Platform::Bale => {
                Credentials::require(platform, self.bale_token.clone(), self.bale_chat_id.clone())
            }
        }
    }

    fn api_base(&self, platform: Platform) -> Option<String> {
        match platform {
            Platform::Telegram => self.telegram_api_base.clone(),
            Platform::Bale => self.bale_api_base.clone(),
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docrelay=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Read one trimmed line from stdin after printing `question`.
fn prompt(question: &str) -> std::io::Result<String> {
    print!("{question}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn resolve_destination(arg: Option<&str>) -> Result<Destination, AppError> {
    let selector = match arg {
        Some(value) => value.to_string(),
        None => prompt("Destination (T = Telegram, B = Bale, A = all): ")?,
    };
    Destination::from_selector(&selector)
}

fn resolve_document(arg: Option<PathBuf>) -> Result<PathBuf, AppError> {
    let path = match arg {
        Some(path) => path,
        None => PathBuf::from(prompt("Path to the .docx file: ")?),
    };
    if path.as_os_str().is_empty() {
        return Err(AppError::Config("no document path given".to_string()));
    }
    Ok(path)
}

fn load_delivery_config(args: &Args) -> Result<DeliveryConfig, AppError> {
    let file = match &args.config {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    Ok(DeliveryConfig::from_tuning(args.tuning().over(file)))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.log_format);

    let destination = match resolve_destination(args.destination.as_deref()) {
        Ok(destination) => destination,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let delivery = match load_delivery_config(&args) {
        Ok(delivery) => delivery,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let mut failed = false;
    let mut targets = Vec::new();
    for &platform in destination.platforms() {
        match args.credentials(platform) {
            Ok(credentials) => targets.push((platform, credentials)),
            Err(e) => {
                error!(platform = platform.name(), error = %e, "Platform not configured, skipping");
                failed = true;
            }
        }
    }
    if targets.is_empty() {
        eprintln!("No configured platform to publish to");
        std::process::exit(1);
    }

    let document = match resolve_document(args.document.clone()) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let options = ExtractOptions {
        mode: args.heading_mode,
        image_dir: args.image_dir.clone(),
    };
    let sections = match document::extract_sections(&document, &options) {
        Ok(sections) => sections,
        Err(e) => {
            error!(path = %document.display(), error = %e, "Failed to read document");
            std::process::exit(1);
        }
    };
    if sections.is_empty() {
        warn!(path = %document.display(), "No Heading 4 sections found, nothing to publish");
    }

    let orchestrator = Orchestrator::new(delivery.pacing, delivery.caption_policy);
    for (platform, credentials) in targets {
        let api = BotApiClient::new(platform, credentials.token, args.api_base(platform));
        let adapter = ChannelAdapter::new(
            Box::new(api),
            AdapterConfig {
                name: platform.name(),
                chat_id: credentials.chat_id,
                limits: delivery.limits_for(platform),
                markers: platform.markers(),
                retry: RetryPolicy::new(delivery.max_retries),
                chunk_delay: delivery.chunk_delay,
            },
        );

        match orchestrator.deliver(&adapter, &sections).await {
            Ok(summary) => {
                info!(
                    platform = platform.name(),
                    sections = summary.sections,
                    skipped = summary.skipped,
                    "Delivery finished"
                );
                println!(
                    "Finished publishing to {}: {}",
                    platform.name(),
                    build_stats_json(platform.name(), adapter.stats())
                );
            }
            Err(e) => {
                error!(platform = platform.name(), error = %e, "Delivery aborted");
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
