//! Optional profile enrichment.
//!
//! [`ProfileSource`] is the seam the lookup pipeline composes: it always
//! yields a match or `None` and never surfaces an error. [`ExaProfileSource`]
//! backs it with the Exa people-search API.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::http::truncate_for_log;
use crate::text::non_empty;

const MAX_HIGHLIGHT_CHARACTERS: u32 = 4000;

#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Best public profile match for a provider, or `None` when nothing
    /// matched or the source failed.
    async fn search(
        &self,
        first_name: &str,
        last_name: &str,
        specialty: &str,
    ) -> Option<ProfileMatch>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMatch {
    pub linkedin_url: Option<String>,
    pub headline: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    pub highlights: Vec<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub work_history: Vec<WorkEntry>,
    pub education_history: Vec<EducationEntry>,
    pub cost_dollars: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkEntry {
    pub title: Option<String>,
    pub company: String,
    pub from: String,
    pub to: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationEntry {
    pub degree: Option<String>,
    pub institution: String,
    pub from: String,
    pub to: String,
}

// Exa search response (only the fields we read).

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Option<Vec<SearchResult>>,
    pub cost_dollars: Option<CostDollars>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CostDollars {
    pub total: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResult {
    pub url: Option<String>,
    pub title: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    pub highlights: Option<Vec<String>>,
    pub entities: Option<Vec<Entity>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Entity {
    pub properties: Option<PersonProperties>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonProperties {
    pub name: Option<String>,
    pub location: Option<String>,
    pub work_history: Option<Vec<RawWork>>,
    pub education_history: Option<Vec<RawEducation>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawWork {
    pub title: Option<String>,
    pub company: Option<NamedRef>,
    pub dates: Option<DateRange>,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawEducation {
    pub degree: Option<String>,
    pub institution: Option<NamedRef>,
    pub dates: Option<DateRange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NamedRef {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

fn ref_name(r: &Option<NamedRef>) -> String {
    r.as_ref()
        .and_then(|r| non_empty(r.name.clone()))
        .unwrap_or_default()
}

fn date_from(d: &Option<DateRange>) -> Option<String> {
    d.as_ref().and_then(|d| non_empty(d.from.clone()))
}

fn date_to(d: &Option<DateRange>) -> Option<String> {
    d.as_ref().and_then(|d| non_empty(d.to.clone()))
}

impl ProfileMatch {
    /// Normalizes the first search result. `None` when there are no results.
    pub fn from_search(resp: &SearchResponse) -> Option<Self> {
        let result = resp.results.as_deref()?.first()?;
        let empty = PersonProperties::default();
        let props = result
            .entities
            .as_deref()
            .and_then(|e| e.first())
            .and_then(|e| e.properties.as_ref())
            .unwrap_or(&empty);

        let work_history = props
            .work_history
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|w| WorkEntry {
                title: w.title.clone(),
                company: ref_name(&w.company),
                from: date_from(&w.dates).unwrap_or_default(),
                to: date_to(&w.dates).unwrap_or_else(|| "Present".to_string()),
                location: non_empty(w.location.clone()),
            })
            .collect();

        let education_history = props
            .education_history
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|e| EducationEntry {
                degree: e.degree.clone(),
                institution: ref_name(&e.institution),
                from: date_from(&e.dates).unwrap_or_default(),
                to: date_to(&e.dates).unwrap_or_default(),
            })
            .collect();

        let cost_dollars = resp
            .cost_dollars
            .as_ref()
            .and_then(|c| c.total)
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(0.0);

        Some(Self {
            linkedin_url: non_empty(result.url.clone()),
            headline: non_empty(result.title.clone()),
            image: non_empty(result.image.clone()),
            author: non_empty(result.author.clone()),
            highlights: result.highlights.clone().unwrap_or_default(),
            name: non_empty(props.name.clone()),
            location: non_empty(props.location.clone()),
            work_history,
            education_history,
            cost_dollars,
        })
    }
}

pub fn build_query(first_name: &str, last_name: &str, specialty: &str) -> String {
    format!("{first_name} {last_name} {specialty} physician")
}

/// Exa people search, one best match per provider.
#[derive(Debug, Clone)]
pub struct ExaProfileSource {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl ExaProfileSource {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    async fn try_search(&self, query: &str) -> anyhow::Result<Option<ProfileMatch>> {
        let body = json!({
            "query": query,
            "category": "people",
            "numResults": 1,
            "type": "auto",
            "contents": {
                "highlights": {
                    "maxCharacters": MAX_HIGHLIGHT_CHARACTERS,
                },
            },
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Exa search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Exa search status {status}. Body: {}", truncate_for_log(&text));
        }

        let parsed: SearchResponse = resp.json().await.context("Invalid Exa search JSON")?;
        Ok(ProfileMatch::from_search(&parsed))
    }
}

#[async_trait]
impl ProfileSource for ExaProfileSource {
    async fn search(
        &self,
        first_name: &str,
        last_name: &str,
        specialty: &str,
    ) -> Option<ProfileMatch> {
        let query = build_query(first_name, last_name, specialty);
        match self.try_search(&query).await {
            Ok(found) => {
                tracing::debug!(%query, matched = found.is_some(), "Exa search finished");
                found
            }
            Err(err) => {
                tracing::warn!(%query, error = %format!("{err:#}"), "Exa enrichment failed");
                None
            }
        }
    }
}
