use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use pixcart::application::coordinator::CheckoutCoordinator;
use pixcart::domain::cart::ProductRef;
use pixcart::domain::order::OrderStatus;
use pixcart::domain::ports::Marketplace;
use pixcart::domain::session::SessionContext;
use pixcart::infrastructure::http::{HttpConfig, HttpMarketplace};
use pixcart::infrastructure::in_memory::InMemoryMarketplace;
use pixcart::interfaces::cli::report_writer::ReportWriter;
use std::io;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Storefront API base URL. Without it an in-memory demo backend is used.
    #[arg(long, env = "PIXCART_API_URL")]
    api_url: Option<String>,

    /// Bearer token of the logged-in buyer.
    #[arg(long, env = "PIXCART_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    /// Buyer user id.
    #[arg(long, env = "PIXCART_BUYER", default_value = "demo-buyer")]
    buyer: String,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current cart.
    Cart,
    /// Add products, check out and create a PIX charge.
    Purchase {
        /// Products as `id` or `id:qty`.
        #[arg(required = true)]
        items: Vec<String>,

        /// Send a simulated confirmation webhook after the charge is created.
        #[arg(long)]
        simulate_payment: bool,
    },
    /// List past orders.
    Orders {
        /// Only show orders with this status.
        #[arg(long)]
        status: Option<OrderStatus>,
    },
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pixcart={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn parse_item(raw: &str) -> Result<(ProductRef, Option<u32>)> {
    match raw.split_once(':') {
        Some((id, qty)) => {
            let qty = qty
                .parse::<u32>()
                .map_err(|e| miette!("invalid quantity in '{raw}': {e}"))?;
            Ok((ProductRef::new(id), Some(qty)))
        }
        None => Ok((ProductRef::new(raw), None)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let session = SessionContext::buyer(cli.buyer.clone(), cli.token.clone());

    if let Some(api_url) = cli.api_url.clone() {
        let config = HttpConfig {
            base_url: api_url,
            timeout: Duration::from_secs(cli.timeout_secs),
        };
        let backend = HttpMarketplace::new(config, &session).into_diagnostic()?;
        run(cli, session, Arc::new(backend)).await
    } else {
        eprintln!("WARNING: No --api-url given. Using the in-memory demo marketplace; nothing is persisted.");
        run(cli, session, Arc::new(InMemoryMarketplace::with_demo_catalog())).await
    }
}

async fn run<B>(cli: Cli, session: SessionContext, backend: Arc<B>) -> Result<()>
where
    B: Marketplace + 'static,
{
    let coordinator = CheckoutCoordinator::login(session, backend)
        .await
        .into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());

    match cli.command {
        Command::Cart => {
            let cart = coordinator.cart().snapshot().await;
            writer.write_cart(&cart).into_diagnostic()?;
        }
        Command::Purchase {
            items,
            simulate_payment,
        } => {
            for raw in &items {
                let (product_ref, qty) = parse_item(raw)?;
                coordinator
                    .add_to_cart(&product_ref, qty)
                    .await
                    .into_diagnostic()?;
            }
            writer
                .write_cart(&coordinator.cart().snapshot().await)
                .into_diagnostic()?;

            let order = coordinator.checkout().await.into_diagnostic()?;
            writer.write_order(&order).into_diagnostic()?;

            let payment = coordinator.pay_current_order().await.into_diagnostic()?;
            writer.write_payment(&payment).into_diagnostic()?;

            let status = if simulate_payment {
                coordinator.simulate_payment().await.into_diagnostic()?
            } else {
                coordinator.refresh_payment().await.into_diagnostic()?
            };
            writer.write_status(status).into_diagnostic()?;
        }
        Command::Orders { status } => {
            let orders = coordinator
                .history()
                .list_by_status(status)
                .await
                .into_diagnostic()?;
            writer.write_orders(&orders).into_diagnostic()?;
        }
    }

    writer.flush().into_diagnostic()?;
    coordinator.logout();
    Ok(())
}
