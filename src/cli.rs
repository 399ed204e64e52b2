use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::constants::{
    DEFAULT_EXA_SEARCH_URL, DEFAULT_NPI_API_BASE_URL, DEFAULT_NPI_API_VERSION,
    EXA_API_KEY_PLACEHOLDER,
};

#[derive(Parser, Debug)]
#[command(name = "npi-lookup")]
#[command(about = "Physician lookup by NPI (NPPES registry + optional Exa profile match)", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP lookup API.
    Serve(ServeArgs),
    /// Run a single lookup and print the merged record as JSON.
    Lookup(LookupArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 8787)]
    pub port: u16,

    #[command(flatten)]
    pub client: ClientArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct LookupArgs {
    /// 10-digit National Provider Identifier.
    pub npi: String,

    #[command(flatten)]
    pub client: ClientArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ClientArgs {
    /// NPI registry API base URL.
    #[arg(long, default_value = DEFAULT_NPI_API_BASE_URL)]
    pub registry_url: String,

    /// NPI registry API version query parameter.
    #[arg(long, default_value = DEFAULT_NPI_API_VERSION)]
    pub registry_version: String,

    /// Extra attempts for transient registry failures. Off unless set.
    #[arg(long, default_value_t = 0)]
    pub registry_retries: u32,

    /// Exa search endpoint used for profile enrichment.
    #[arg(long, default_value = DEFAULT_EXA_SEARCH_URL)]
    pub enrichment_url: String,

    /// Exa API key. Enrichment is skipped when unset.
    #[arg(long, env = "EXA_API_KEY", hide_env_values = true)]
    pub exa_api_key: Option<String>,

    /// Timeout for each outbound request, in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ClientArgs {
    /// The usable enrichment credential, if one is configured.
    pub fn enrichment_key(&self) -> Option<String> {
        self.exa_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != EXA_API_KEY_PLACEHOLDER)
            .map(ToOwned::to_owned)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
