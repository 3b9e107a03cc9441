use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use copydesk::builder::GenerationOutcome;
use copydesk_cli::{
    cli::{AnyRequest, Cli, Command},
    commands,
    config::Config,
    progress::ProgressPrinter,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    match cli.command {
        Command::Login { token } => {
            commands::login(&config, &token)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Logout => {
            commands::logout(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Generate(args) => {
            let request = AnyRequest::from_args(&args, &config.generation.language)?;
            let credentials = commands::credentials(&config)?;
            let studio = commands::build_studio(&config, credentials)?;

            tracing::info!("Agent service: {}", config.generation.base_url);

            let interrupt = async {
                if tokio::signal::ctrl_c().await.is_err() {
                    // no signal handler available; never interrupt
                    std::future::pending::<()>().await;
                }
            };

            let mut progress = ProgressPrinter::new(std::io::stderr());
            let report =
                commands::generate(&studio, &request, args.save, interrupt, &mut progress).await?;

            match &report.outcome {
                GenerationOutcome::Completed { result, .. } => {
                    println!("{}", serde_json::to_string_pretty(result)?);
                    if let Some(saved) = &report.saved {
                        eprintln!(
                            "Saved {} ({} variants)",
                            saved.record.id,
                            saved.variants.len()
                        );
                    }
                }
                GenerationOutcome::Failed(message) => eprintln!("Generation failed: {}", message),
                GenerationOutcome::Cancelled => {}
            }

            Ok(report.exit_code())
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout carries the result JSON, so logs go to stderr
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
