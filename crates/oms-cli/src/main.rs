use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oms::exchange::{DeribitClient, HttpTransport};
use oms::{Dispatcher, LatencyRecorder, LogSink, WorkerPool};

mod args;
mod prompt;
mod session;

use args::App;
use prompt::Prompter;

fn main() -> Result<ExitCode> {
    let args = App::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oms=info,oms_cli=info".into()),
        )
        // stdout belongs to the operator
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = args.into_config()?;

    let transport = HttpTransport::new(config.timeout())?;
    let mut client = DeribitClient::new(transport, config.base_url.as_str());
    match &config.credentials {
        Some(credentials) => {
            if let Err(err) = client.authenticate(&credentials.client_id, &credentials.client_secret) {
                tracing::error!("Authentication failed: {}", err);
            }
        }
        None => tracing::warn!("No credentials configured, private commands will be rejected"),
    }

    let recorder = LatencyRecorder::new(Arc::new(LogSink::open(&config.log_file)));
    let pool = WorkerPool::start(config.workers)?;
    let dispatcher = Dispatcher::new(pool, Arc::new(client), recorder);

    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
    session::run(&dispatcher, &mut prompter)?;

    let stats = dispatcher.stats();
    tracing::info!(
        "Processed {} commands ({} failed)",
        stats.completed + stats.failed,
        stats.failed
    );

    Ok(ExitCode::SUCCESS)
}
