use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;

use crate::cli::ClientArgs;
use crate::http::build_client;
use crate::npi::{Provider, RegistryClient};
use crate::profile::{ExaProfileSource, ProfileMatch, ProfileSource};

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("invalid NPI input")]
    InvalidInput,
    #[error("no provider found")]
    NotFound,
    #[error("NPI registry failure: {0:#}")]
    Upstream(anyhow::Error),
    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl LookupError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller. Upstream detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidInput => "Please enter a valid 10-digit NPI number.",
            Self::NotFound => "No provider found for this NPI number.",
            Self::Upstream(_) | Self::Internal(_) => {
                "An unexpected error occurred. Please try again."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub provider: Provider,
    pub profile: Option<ProfileMatch>,
}

pub fn is_valid_npi(s: &str) -> bool {
    s.len() == 10 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Registry lookup followed by optional profile enrichment.
#[derive(Clone)]
pub struct LookupService {
    registry: RegistryClient,
    profiles: Option<Arc<dyn ProfileSource>>,
}

impl LookupService {
    pub fn new(registry: RegistryClient, profiles: Option<Arc<dyn ProfileSource>>) -> Self {
        Self { registry, profiles }
    }

    pub fn from_args(args: &ClientArgs) -> anyhow::Result<Self> {
        let client = build_client(args.timeout())?;
        let registry = RegistryClient::new(
            client.clone(),
            args.registry_url.clone(),
            args.registry_version.clone(),
            args.registry_retries,
        );
        let profiles = args.enrichment_key().map(|key| {
            Arc::new(ExaProfileSource::new(client, args.enrichment_url.clone(), key))
                as Arc<dyn ProfileSource>
        });
        if profiles.is_none() {
            tracing::info!("EXA_API_KEY not configured; profile enrichment disabled");
        }
        Ok(Self::new(registry, profiles))
    }

    pub fn enrichment_enabled(&self) -> bool {
        self.profiles.is_some()
    }

    pub async fn handle(&self, raw: Option<&str>) -> Result<LookupResult, LookupError> {
        let res = self.run(raw).await;
        let input = raw.unwrap_or_default();
        match &res {
            Ok(r) => tracing::info!(
                npi = %r.provider.npi_number,
                matched_profile = r.profile.is_some(),
                "lookup complete"
            ),
            Err(LookupError::InvalidInput) => tracing::debug!("rejected malformed NPI input"),
            Err(LookupError::NotFound) => tracing::warn!(npi = input, "no registry record"),
            Err(err) => tracing::error!(npi = input, error = %err, "lookup failed"),
        }
        res
    }

    async fn run(&self, raw: Option<&str>) -> Result<LookupResult, LookupError> {
        let npi = match raw {
            Some(s) if is_valid_npi(s) => s,
            _ => return Err(LookupError::InvalidInput),
        };

        let provider = self
            .registry
            .lookup(npi)
            .await
            .map_err(LookupError::Upstream)?
            .ok_or(LookupError::NotFound)?;

        let profile = match &self.profiles {
            Some(source) => {
                source
                    .search(&provider.first_name, &provider.last_name, &provider.specialty)
                    .await
            }
            None => None,
        };

        Ok(LookupResult { provider, profile })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npi_format() {
        assert!(is_valid_npi("1234567893"));
        assert!(!is_valid_npi(""));
        assert!(!is_valid_npi("123456789"));
        assert!(!is_valid_npi("12345678901"));
        assert!(!is_valid_npi("12345abcde"));
        assert!(!is_valid_npi(" 1234567893"));
        assert!(!is_valid_npi("１２３４５６７８９０"));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(LookupError::InvalidInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(LookupError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            LookupError::Upstream(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            LookupError::Internal(anyhow::anyhow!("boom")).public_message(),
            "An unexpected error occurred. Please try again."
        );
    }
}
