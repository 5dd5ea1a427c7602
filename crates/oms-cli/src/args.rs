use std::ops::RangeFrom;
use std::path::PathBuf;
use std::result;

use clap::Parser;
use oms::config::Credentials;
use oms::{Config, Error};

#[derive(Debug, Parser)]
#[command(name = "oms-cli", version, about = "Interactive order dispatcher for the Deribit test API")]
pub struct App {
    /// JSON configuration file; flags override its values
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Number of worker threads
    #[arg(value_parser = workers_in_range)]
    #[clap(short, long)]
    pub workers: Option<usize>,

    /// Latency log, opened in append mode
    #[clap(long)]
    pub log_file: Option<PathBuf>,

    #[clap(long)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[clap(long)]
    pub timeout_secs: Option<u64>,

    #[clap(long, env = "DERIBIT_CLIENT_ID")]
    pub client_id: Option<String>,

    #[clap(long, env = "DERIBIT_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,
}

impl App {
    pub fn into_config(self) -> oms::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = log_file;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }

        match (self.client_id, self.client_secret) {
            (Some(client_id), Some(client_secret)) => {
                config.credentials = Some(Credentials {
                    client_id,
                    client_secret,
                });
            }
            (None, None) => {}
            _ => {
                return Err(Error::Config(
                    "--client-id and --client-secret must be given together".into(),
                ))
            }
        }

        config.validate()?;
        Ok(config)
    }
}

const WORKER_RANGE: RangeFrom<usize> = 1..;

pub fn workers_in_range(s: &str) -> result::Result<usize, String> {
    let workers: usize = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a worker count"))?;
    if WORKER_RANGE.contains(&workers) {
        Ok(workers)
    } else {
        Err(format!("worker count must be at least {}", WORKER_RANGE.start))
    }
}
