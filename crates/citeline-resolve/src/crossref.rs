//! Crossref REST API resolver.
//!
//! Each identifier is fetched from `GET {base_url}/works/{doi}`; lookups
//! within a batch run with bounded concurrency. The `message` object is
//! reduced to title, authors, publication date and cited DOIs.

use std::time::Duration;

use citeline_core::{CrossrefConfig, Error, Identifier, PartialDate, PublicationDate, Result};
use citeline_graph::{Author, ResolvedWork};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::resolver::{BatchResponse, MetadataResolver, ResolutionFailure};

/// Date fields tried in order for the publication date.
const DATE_FIELDS: &[&str] = &["issued", "published-print", "published-online", "created"];

const ORCID_PREFIXES: &[&str] = &["https://orcid.org/", "http://orcid.org/"];

pub struct CrossrefResolver {
    client: Client,
    base_url: Url,
    max_concurrency: usize,
}

impl CrossrefResolver {
    pub fn new(config: &CrossrefConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("crossref.base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "crossref.base_url is not a base URL: {}",
                config.base_url
            )));
        }

        let user_agent = match &config.mailto {
            Some(mailto) => format!("citeline/{} (mailto:{})", env!("CARGO_PKG_VERSION"), mailto),
            None => format!("citeline/{}", env!("CARGO_PKG_VERSION")),
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            max_concurrency: config.max_concurrency.max(1),
        })
    }

    fn work_url(&self, id: &Identifier) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("works").push(id.as_str());
        }
        url
    }

    async fn fetch_one(&self, id: &Identifier) -> std::result::Result<ResolvedWork, String> {
        let url = self.work_url(id);
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(format!("Crossref has no record for {}", id)),
            status => return Err(format!("Crossref returned status {}", status)),
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("Invalid response body: {}", e))?;
        parse_work(id, &body)
    }
}

impl MetadataResolver for CrossrefResolver {
    fn name(&self) -> &'static str {
        "crossref"
    }

    fn resolve_batch<'a>(
        &'a self,
        identifiers: &'a [Identifier],
    ) -> BoxFuture<'a, Result<BatchResponse>> {
        async move {
            let lookups: Vec<_> = identifiers
                .iter()
                .map(|id| async move { (id, self.fetch_one(id).await) }.boxed())
                .collect();
            let results: Vec<_> = futures::stream::iter(lookups)
                .buffered(self.max_concurrency)
                .collect()
                .await;

            let mut response = BatchResponse::default();
            for (id, result) in results {
                match result {
                    Ok(work) => response.resolved.push(work),
                    Err(reason) => {
                        warn!("Crossref lookup failed for {}: {}", id, reason);
                        response.failures.push(ResolutionFailure {
                            identifier: id.to_string(),
                            reason,
                        });
                    }
                }
            }
            Ok(response)
        }
        .boxed()
    }
}

/// Reduce a Crossref `works` response to a [`ResolvedWork`].
///
/// The requested identifier is kept even when Crossref reports an alias DOI,
/// so the result lines up with the record that asked for it.
pub fn parse_work(requested: &Identifier, body: &Value) -> std::result::Result<ResolvedWork, String> {
    let message = body
        .get("message")
        .filter(|m| m.is_object())
        .ok_or_else(|| "Response has no message object".to_string())?;

    let title = message["title"]
        .get(0)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);

    let published = DATE_FIELDS
        .iter()
        .find_map(|field| date_parts(&message[*field]["date-parts"]))
        .map(PublicationDate::Known);

    let authors = message["author"]
        .as_array()
        .map(|list| list.iter().filter_map(parse_author).collect())
        .unwrap_or_default();

    let references = message["reference"]
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|r| r.get("DOI").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Ok(ResolvedWork {
        identifier: requested.to_string(),
        title,
        authors,
        published,
        references,
    })
}

/// `[[year, month?, day?]]`, stopping at the first null.
fn date_parts(value: &Value) -> Option<PartialDate> {
    let parts: Vec<i64> = value
        .get(0)?
        .as_array()?
        .iter()
        .map_while(Value::as_i64)
        .collect();
    PartialDate::from_parts(&parts).ok()
}

/// `"given family"`, or `name` for organisations, plus the bare ORCID iD.
fn parse_author(author: &Value) -> Option<Author> {
    let given = author["given"].as_str().map(str::trim).unwrap_or("");
    let family = author["family"].as_str().map(str::trim).unwrap_or("");
    let full = format!("{} {}", given, family).trim().to_string();
    let name = if full.is_empty() {
        author["name"]
            .as_str()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)?
    } else {
        full
    };

    let orcid = author["ORCID"]
        .as_str()
        .map(|raw| {
            let raw = raw.trim();
            ORCID_PREFIXES
                .iter()
                .find_map(|p| raw.strip_prefix(p))
                .unwrap_or(raw)
                .to_string()
        })
        .filter(|o| !o.is_empty());

    Some(Author { name, orcid })
}
