use std::time::Duration;

use anyhow::{Context, anyhow};
use reqwest::{Client, header::RETRY_AFTER};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{is_retryable_status, parse_retry_after, truncate_for_log};
use crate::text::{format_zip, non_empty, title_case};

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
pub struct NpiApiResponse {
    pub results: Option<Vec<NpiResult>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NpiResult {
    pub number: Option<Value>,
    pub enumeration_type: Option<String>,
    pub basic: Option<NpiBasic>,
    pub taxonomies: Option<Vec<NpiTaxonomy>>,
    pub addresses: Option<Vec<NpiAddress>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NpiBasic {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub credential: Option<String>,
    pub name_prefix: Option<String>,
    pub sex: Option<String>,
    pub enumeration_date: Option<String>,
    pub last_updated: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NpiTaxonomy {
    pub desc: Option<String>,
    pub primary: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NpiAddress {
    pub address_purpose: Option<String>,
    pub address_1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub telephone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub npi_number: String,
    pub first_name: String,
    pub last_name: String,
    pub credential: String,
    pub name_prefix: String,
    pub sex: String,
    pub specialty: String,
    pub all_specialties: Vec<String>,
    pub practice_address: PracticeAddress,
    pub enumeration_type: String,
    pub enumeration_date: String,
    pub last_updated: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PracticeAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
}

impl Provider {
    /// Normalizes one registry result. `requested_npi` stands in when the
    /// result carries no usable `number`.
    pub fn from_registry(r: &NpiResult, requested_npi: &str) -> Self {
        let empty = NpiBasic::default();
        let basic = r.basic.as_ref().unwrap_or(&empty);
        let taxonomies = r.taxonomies.as_deref().unwrap_or_default();

        let npi_number = match &r.number {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => requested_npi.to_string(),
        };

        let status = if basic.status.as_deref() == Some("A") {
            "Active"
        } else {
            "Inactive"
        };

        Self {
            npi_number,
            first_name: title_case(basic.first_name.as_deref()),
            last_name: title_case(basic.last_name.as_deref()),
            credential: basic.credential.clone().unwrap_or_default(),
            name_prefix: basic.name_prefix.clone().unwrap_or_default(),
            sex: basic.sex.clone().unwrap_or_default(),
            specialty: primary_specialty(taxonomies),
            all_specialties: all_specialties(taxonomies),
            practice_address: practice_address(r.addresses.as_deref().unwrap_or_default()),
            enumeration_type: r.enumeration_type.clone().unwrap_or_default(),
            enumeration_date: basic.enumeration_date.clone().unwrap_or_default(),
            last_updated: basic.last_updated.clone().unwrap_or_default(),
            status: status.to_string(),
        }
    }
}

fn primary_specialty(taxonomies: &[NpiTaxonomy]) -> String {
    taxonomies
        .iter()
        .find(|t| t.primary.unwrap_or(false))
        .or_else(|| taxonomies.first())
        .and_then(|t| non_empty(t.desc.clone()))
        .unwrap_or_else(|| "Unknown".to_string())
}

fn all_specialties(taxonomies: &[NpiTaxonomy]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for desc in taxonomies.iter().filter_map(|t| t.desc.as_deref()) {
        if !desc.is_empty() && !out.iter().any(|d| d == desc) {
            out.push(desc.to_string());
        }
    }
    out
}

fn practice_address(addresses: &[NpiAddress]) -> PracticeAddress {
    let chosen = addresses
        .iter()
        .find(|a| a.address_purpose.as_deref() == Some("LOCATION"))
        .or_else(|| addresses.first());
    let Some(a) = chosen else {
        return PracticeAddress::default();
    };
    PracticeAddress {
        address: a.address_1.clone().unwrap_or_default(),
        city: title_case(a.city.as_deref()),
        state: a.state.clone().unwrap_or_default(),
        zip: format_zip(a.postal_code.as_deref()),
        phone: a.telephone_number.clone().unwrap_or_default(),
    }
}

/// Client for the NPPES NPI registry API.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: String,
    version: String,
    retries: u32,
}

impl RegistryClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        version: impl Into<String>,
        retries: u32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            version: version.into(),
            retries,
        }
    }

    /// Fetches and normalizes the first registry result for `npi`.
    ///
    /// `Ok(None)` means the registry answered with no results. Transport
    /// failures, non-2xx statuses and unparseable bodies are errors.
    pub async fn lookup(&self, npi: &str) -> anyhow::Result<Option<Provider>> {
        let body = self.fetch(npi).await?;
        Ok(body
            .results
            .unwrap_or_default()
            .first()
            .map(|r| Provider::from_registry(r, npi)))
    }

    async fn fetch(&self, npi: &str) -> anyhow::Result<NpiApiResponse> {
        let attempts = self.retries.saturating_add(1);
        let mut backoff = INITIAL_BACKOFF;

        for attempt in 1..=attempts {
            let response = self
                .client
                .get(&self.base_url)
                .query(&[("version", self.version.as_str()), ("number", npi)])
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp
                            .json::<NpiApiResponse>()
                            .await
                            .with_context(|| format!("Invalid NPI API JSON for {npi}"));
                    }

                    let retry_after = parse_retry_after(resp.headers().get(RETRY_AFTER));
                    let body = resp.text().await.unwrap_or_default();
                    if is_retryable_status(status) && attempt < attempts {
                        tracing::warn!(npi, %status, attempt, "NPI API retryable status");
                        tokio::time::sleep(retry_after.unwrap_or(backoff).min(MAX_BACKOFF)).await;
                        backoff = (backoff + backoff).min(MAX_BACKOFF);
                        continue;
                    }

                    return Err(anyhow!(
                        "NPI API status {} for {} after {} attempt(s). Body: {}",
                        status,
                        npi,
                        attempt,
                        truncate_for_log(&body)
                    ));
                }
                Err(err) => {
                    if attempt == attempts {
                        return Err(anyhow!("NPI API request failed for {npi}: {err}"));
                    }
                    tracing::warn!(npi, attempt, error = %err, "NPI API request failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff + backoff).min(MAX_BACKOFF);
                }
            }
        }

        Err(anyhow!("Unexpected NPI API flow for {npi}"))
    }
}
