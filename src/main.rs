use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tracing::{error, info};
use yadisk_csv::{
    config::{AppendConfig, Settings},
    credential::Credential,
    deploy,
    job::{AppendJob, storage::disk},
    table::Record,
};

#[derive(Parser)]
#[clap(version, about = "Append JSON records as rows to a CSV file on Yandex Disk")]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append records to the configured CSV file
    Append {
        #[clap(short, long, env = "YADISK_CSV_CONFIG")]
        config: PathBuf,
        /// JSON array of records, `-` reads stdin
        #[clap(short, long, default_value = "-")]
        input: PathBuf,
        #[clap(flatten)]
        remote: Remote,
        /// Append to an empty in-memory disk and print the resulting file to stderr
        #[clap(long)]
        dry_run: bool,
    },
    /// Check that the access token is accepted
    CheckCredential {
        #[clap(flatten)]
        remote: Remote,
    },
}

#[derive(clap::Args)]
struct Remote {
    #[clap(long, env = "YADISK_OAUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,
    #[clap(long, env = "YADISK_API_ENDPOINT", default_value = deploy::yandex::DEFAULT_ENDPOINT)]
    endpoint: String,
}

impl Remote {
    fn client(&self) -> anyhow::Result<deploy::yandex::disk::Client> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("access token is required (--token or YADISK_OAUTH_TOKEN)"))?;
        deploy::yandex::disk::Client::new(&self.endpoint, Credential::new(token))
            .with_context(|| format!("create client for {}", self.endpoint))
    }
}

async fn read_records(input: &Path) -> anyhow::Result<Vec<Record>> {
    let content = if input == Path::new("-") {
        let mut content = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut content)
            .await
            .with_context(|| "read records from stdin")?;
        content
    } else {
        tokio::fs::read(input)
            .await
            .with_context(|| format!("read records from {}", input.display()))?
    };
    serde_json::from_slice(&content).with_context(|| "parse records")
}

async fn append<D>(disk: &D, settings: &Settings, records: Vec<Record>) -> anyhow::Result<Vec<Record>>
where
    D: disk::Client,
    D::Error: std::error::Error + Send + Sync + 'static,
{
    let job = AppendJob { disk, settings };
    job.run(records)
        .await
        .with_context(|| format!("append to {}", settings.path))
}

async fn run(opts: Opts) -> anyhow::Result<()> {
    match opts.command {
        Command::Append {
            config,
            input,
            remote,
            dry_run,
        } => {
            let settings = AppendConfig::load(&config)
                .await
                .with_context(|| format!("load config from {}", config.display()))?
                .compile()
                .with_context(|| format!("validate config from {}", config.display()))?;
            let records = read_records(&input).await?;
            let output = if dry_run {
                let disk = deploy::local::disk::Client::new();
                let output = append(&disk, &settings, records).await?;
                if let Some(file) = disk.file(&settings.path).await {
                    tokio::io::stderr()
                        .write_all(&file.body)
                        .await
                        .with_context(|| "write dry run result")?;
                }
                output
            } else {
                append(&remote.client()?, &settings, records).await?
            };
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&serde_json::to_vec_pretty(&output)?)
                .await
                .with_context(|| "write output records")?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Command::CheckCredential { remote } => {
            let info = remote
                .client()?
                .disk_info()
                .await
                .with_context(|| "check credential")?;
            let login = info
                .user
                .and_then(|user| user.login)
                .unwrap_or_default();
            info!(
                login = %login,
                total_space = info.total_space,
                used_space = info.used_space,
                "credential accepted"
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    if let Err(e) = run(opts).await {
        error!(?e, "critical error");
        std::process::exit(1);
    }
}
