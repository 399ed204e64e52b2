use anyhow::Context;
use clap::Parser;

use npi_lookup::cli::{self, LookupArgs};
use npi_lookup::lookup::LookupService;
use npi_lookup::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    match args.cmd {
        cli::Command::Serve(cmd) => server::run(cmd).await.context("serve failed"),
        cli::Command::Lookup(cmd) => lookup_once(cmd).await,
    }
}

async fn lookup_once(cmd: LookupArgs) -> anyhow::Result<()> {
    let service = LookupService::from_args(&cmd.client).context("configure lookup clients")?;
    match service.handle(Some(&cmd.npi)).await {
        Ok(result) => {
            let out = serde_json::to_string_pretty(&result).context("serialize lookup result")?;
            println!("{out}");
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.public_message());
            std::process::exit(match err.status().as_u16() {
                400 => 2,
                404 => 3,
                _ => 1,
            });
        }
    }
}
