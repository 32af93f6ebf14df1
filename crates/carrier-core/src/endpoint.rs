use crate::error::{CarrierError, Result};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Classified result of submitting one update to the endpoint.
///
/// The three-way split drives partial-failure handling: only `Rejected`
/// units are quarantined for human review (they will never succeed
/// unmodified), while `Unreachable` units stay pending so a future run
/// retries them once the transient condition clears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The endpoint accepted and committed the update.
    Applied,
    /// The endpoint understood the request but refused it (malformed
    /// update syntax, constraint violation). Terminal for this unit.
    Rejected(String),
    /// Transport-level failure (timeout, connection refused, 5xx). The
    /// unit's status at the endpoint is unknown and unchanged here.
    Unreachable(String),
}

/// Executes one update against the remote graph-data service.
pub trait UpdateEndpoint {
    fn apply(&self, payload: &str) -> Outcome;
}

// ---------------------------------------------------------------------------
// SparqlEndpoint
// ---------------------------------------------------------------------------

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// SPARQL 1.1 update endpoint: one direct POST per unit with a
/// `application/sparql-update` body. No retry inside a run.
pub struct SparqlEndpoint {
    http: reqwest::blocking::Client,
    url: String,
}

impl SparqlEndpoint {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// The per-call timeout bounds how long an `Unreachable`
    /// classification can take; there is no run-level timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CarrierError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

impl UpdateEndpoint for SparqlEndpoint {
    fn apply(&self, payload: &str) -> Outcome {
        let response = self
            .http
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/sparql-update")
            .body(payload.to_string())
            .send();

        let response = match response {
            Ok(r) => r,
            Err(e) => return Outcome::Unreachable(e.to_string()),
        };

        let status = response.status();
        if status.is_success() {
            Outcome::Applied
        } else if status.is_client_error() {
            let body = response.text().unwrap_or_default();
            Outcome::Rejected(format!("HTTP {}: {}", status.as_u16(), excerpt(&body)))
        } else {
            Outcome::Unreachable(format!("HTTP {}", status.as_u16()))
        }
    }
}

/// First line of the body, capped, so diagnostics stay one line.
fn excerpt(body: &str) -> String {
    let line = body.lines().next().unwrap_or("");
    line.chars().take(200).collect()
}
