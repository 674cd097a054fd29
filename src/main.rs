use campus_portal::application::conversation::{
    AUTO_REPLY, ConversationSession, DEFAULT_REPLY_DELAY, Directory,
};
use campus_portal::application::notifications::NotificationCenter;
use campus_portal::application::status_tracker::{CERTIFICATE_REQUEST, ServiceCatalog};
use campus_portal::application::transaction_flow::{FlowState, Step, TransactionFlow};
use campus_portal::config::{DEFAULT_API_KEY, DEFAULT_BASE_URL, DEFAULT_MERCHANT_ID, GatewayConfig};
use campus_portal::domain::payment::{OutcomeRecord, PaymentCategory, PaymentOutcome};
use campus_portal::domain::ports::GatewayBox;
use campus_portal::error::Result as PortalResult;
use campus_portal::infrastructure::http::HttpGateway;
use campus_portal::infrastructure::simulated::SimulatedGateway;
use campus_portal::interfaces::csv::receipt_writer::{BatchRecord, ReceiptWriter};
use campus_portal::interfaces::csv::request_reader::RequestReader;
use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, miette};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter, e.g. `info` or `campus_portal=debug`
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pay one amount and commit it
    Pay(PayArgs),
    /// Run every row of a CSV file through its own payment flow
    Batch(BatchArgs),
    /// Show the graduation certificate request status
    Status,
    /// Send a message to a student-affairs contact and wait for the reply
    Chat(ChatArgs),
    /// List the notification inbox
    Notifications(NotificationsArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum GatewayKind {
    Simulated,
    Http,
}

#[derive(Args)]
struct GatewayArgs {
    /// Which gateway adapter to use
    #[arg(long, value_enum, default_value = "simulated")]
    gateway: GatewayKind,

    #[arg(long, env = "PORTAL_GATEWAY_URL", default_value = DEFAULT_BASE_URL)]
    gateway_url: String,

    #[arg(long, env = "PORTAL_MERCHANT_ID", default_value = DEFAULT_MERCHANT_ID)]
    merchant_id: String,

    #[arg(long, env = "PORTAL_API_KEY", default_value = DEFAULT_API_KEY, hide_env_values = true)]
    api_key: String,

    /// Artificial latency of the simulated gateway, in milliseconds
    #[arg(long)]
    latency_ms: Option<u64>,

    /// Make the simulated gateway decline every payment with this message
    #[arg(long)]
    decline: Option<String>,

    /// Student id the payments are made for
    #[arg(long, default_value = "2023145786")]
    payer: String,
}

impl GatewayArgs {
    fn build(&self) -> Result<GatewayBox> {
        match self.gateway {
            GatewayKind::Simulated => {
                let mut gateway = SimulatedGateway::new();
                if let Some(ms) = self.latency_ms {
                    let latency = Duration::from_millis(ms);
                    gateway = gateway.with_latency(latency, latency);
                }
                if let Some(message) = &self.decline {
                    gateway = gateway.declining(message.clone());
                }
                Ok(Box::new(gateway))
            }
            GatewayKind::Http => {
                let config =
                    GatewayConfig::new(&self.gateway_url, &self.merchant_id, &self.api_key)
                        .into_diagnostic()?;
                Ok(Box::new(HttpGateway::new(config).into_diagnostic()?))
            }
        }
    }
}

#[derive(Args)]
struct PayArgs {
    /// Amount to pay
    #[arg(long)]
    amount: String,

    #[arg(long, default_value = "tuition")]
    category: String,

    /// Term label the payment belongs to
    #[arg(long, default_value = "Spring-2025")]
    period: String,

    #[arg(long, default_value = "")]
    description: String,

    #[command(flatten)]
    gateway: GatewayArgs,
}

#[derive(Args)]
struct BatchArgs {
    /// CSV file with `amount, category, period, description` rows
    input: PathBuf,

    #[command(flatten)]
    gateway: GatewayArgs,
}

#[derive(Args)]
struct ChatArgs {
    /// Correspondent id (c1, c2, c3)
    #[arg(long)]
    to: String,

    #[arg(long)]
    message: String,

    /// Reply delay in milliseconds
    #[arg(long)]
    reply_ms: Option<u64>,
}

#[derive(Args)]
struct NotificationsArgs {
    /// all, unread, or a category (academic, event, announcement, important)
    #[arg(long, default_value = "all")]
    filter: String,

    /// Open this notification, marking it read
    #[arg(long)]
    open: Option<u32>,

    #[arg(long)]
    mark_all_read: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    match cli.command {
        Command::Pay(args) => pay(args).await,
        Command::Batch(args) => batch(args).await,
        Command::Status => status(),
        Command::Chat(args) => chat(args).await,
        Command::Notifications(args) => notifications(args),
    }
}

/// Drives the flow from Form to a terminal state. Returns the last state reached.
async fn run_flow(flow: &TransactionFlow) -> PortalResult<FlowState> {
    let mut state = match flow.submit().await? {
        Step::Advanced(state) => state,
        Step::AlreadyInFlight => return Ok(flow.state()),
    };
    if matches!(state, FlowState::Confirmation { .. })
        && let Step::Advanced(next) = flow.confirm().await?
    {
        state = next;
    }
    Ok(state)
}

async fn pay(args: PayArgs) -> Result<()> {
    let category: PaymentCategory = args.category.parse().into_diagnostic()?;
    let flow = TransactionFlow::new(args.gateway.build()?, &args.gateway.payer, &args.period);
    if !flow.set_amount_input(&args.amount).into_diagnostic()? {
        return Err(miette!("Malformed amount: {}", args.amount));
    }
    flow.set_category(category).into_diagnostic()?;
    flow.set_description(args.description).into_diagnostic()?;

    let outcome = match run_flow(&flow).await.into_diagnostic()? {
        FlowState::Success(receipt) => {
            PaymentOutcome::accepted(receipt.transaction_id, receipt.message)
        }
        FlowState::Error { message } => PaymentOutcome::rejected(message),
        other => return Err(miette!("Payment stopped in the {} state", other.name())),
    };

    let record = OutcomeRecord::from(&outcome);
    println!("{}", serde_json::to_string(&record).into_diagnostic()?);
    if outcome.is_accepted() {
        Ok(())
    } else {
        Err(miette!("Payment failed: {}", outcome.message()))
    }
}

async fn batch(args: BatchArgs) -> Result<()> {
    let file = File::open(&args.input).into_diagnostic()?;
    let reader = RequestReader::new(file);
    let stdout = io::stdout();
    let mut writer = ReceiptWriter::new(stdout.lock());

    // Rows are numbered from 1, not counting the header.
    for (index, row) in reader.rows().enumerate() {
        let number = index + 1;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                eprintln!("Error reading payment row {}: {}", number, e);
                continue;
            }
        };

        let flow = TransactionFlow::new(args.gateway.build()?, &args.gateway.payer, &row.period);
        let state = match row.fill(&flow) {
            Ok(()) => run_flow(&flow).await,
            Err(e) => Err(e),
        };
        match state {
            Ok(state) => {
                if let Some(record) = BatchRecord::from_state(&state, &flow.draft()) {
                    writer.write(&record).into_diagnostic()?;
                }
            }
            Err(e) => eprintln!("Error processing payment row {}: {}", number, e),
        }
    }

    writer.finish().into_diagnostic()?;
    Ok(())
}

fn status() -> Result<()> {
    let mut catalog = ServiceCatalog::graduation().into_diagnostic()?;
    catalog.select(CERTIFICATE_REQUEST).into_diagnostic()?;
    let json = serde_json::to_string_pretty(catalog.tracker()).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

async fn chat(args: ChatArgs) -> Result<()> {
    let delay = args
        .reply_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_REPLY_DELAY);
    let session = ConversationSession::new(Directory::demo()).with_reply(delay, AUTO_REPLY);
    session.select_correspondent(&args.to).into_diagnostic()?;

    let before = session.messages().len();
    if session.send(&args.message).is_none() {
        return Err(miette!("Nothing to send"));
    }
    // The sent message plus one reply.
    let limit = delay * 2 + Duration::from_secs(1);
    if !session.wait_for_messages(before + 2, limit).await {
        return Err(miette!("No reply received within {} ms", limit.as_millis()));
    }

    for message in session.messages() {
        println!("{}", serde_json::to_string(&message).into_diagnostic()?);
    }
    Ok(())
}

fn notifications(args: NotificationsArgs) -> Result<()> {
    let mut center = NotificationCenter::demo().into_diagnostic()?;
    center.set_filter(args.filter.parse().into_diagnostic()?);
    if args.mark_all_read {
        center.mark_all_read();
    }
    if let Some(id) = args.open {
        let opened = center.open(id).into_diagnostic()?;
        println!("{}", serde_json::to_string(opened).into_diagnostic()?);
    }

    for notification in center.visible() {
        println!("{}", serde_json::to_string(notification).into_diagnostic()?);
    }
    println!("Unread: {}", center.unread_count());
    Ok(())
}
