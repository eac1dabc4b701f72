use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vivea_api::FormSubmission;
use vivea_forms::{FormHandler, SiteConfig};

#[derive(Parser, Debug)]
#[command(name = "vivea-submit", about = "Submit a Vivéa water test request")]
struct Args {
    /// Site config YAML; VIVEA_* environment variables override it
    #[arg(short, long, env = "VIVEA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a request through the fallback chain
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List locally backed-up requests
    Pending,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    opentelemetry::global::set_text_map_propagator(
        opentelemetry_sdk::propagation::TraceContextPropagator::new(),
    );

    let config = SiteConfig::load(args.config.as_deref())?;
    let handler = FormHandler::from_config(&config)?;

    match args.command {
        Command::Submit {
            name,
            phone,
            email,
            address,
            notes,
        } => {
            let form = FormSubmission {
                address,
                notes,
                ..FormSubmission::new(name, phone, email)
            };
            match handler.submit(form).await {
                Ok(result) => {
                    println!("{}", serde_json::to_string_pretty(&result.summary())?);
                    if !result.is_success() {
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    for message in &e.errors {
                        eprintln!("{}", message);
                    }
                    std::process::exit(2);
                }
            }
        }
        Command::Pending => {
            let records = handler.pending_requests().await;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }

    Ok(())
}
