use crate::error::{DepositError, Result};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

const API_TIMEOUT: Duration = Duration::from_secs(30);
// Large archive uploads can legitimately take a long time; the content
// PUT gets its own generous timeout.
const CONTENT_TIMEOUT: Duration = Duration::from_secs(3600);
const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// A draft record created on the repository, with the URL its files are
/// registered against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub id: String,
    pub files_url: String,
}

// ---------------------------------------------------------------------------
// DepositClient
// ---------------------------------------------------------------------------

/// Blocking client for the InvenioRDM records API.
pub struct DepositClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
    user_agent: String,
    max_attempts: u32,
}

impl DepositClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Result<Self> {
        let mut base_url: String = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        if let Some(stripped) = base_url.strip_suffix("/api") {
            base_url = stripped.to_string();
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(API_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url,
            token: token.into(),
            user_agent: user_agent.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Bound the transport-error retry loop in [`upload_file`]. Mainly for
    /// tests; the default is 8 attempts.
    ///
    /// [`upload_file`]: DepositClient::upload_file
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, url: &str) -> reqwest::blocking::RequestBuilder {
        self.http
            .post(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
    }

    /// Create a new draft record. Expects HTTP 201.
    pub fn create_draft(&self, record: &Value) -> Result<Draft> {
        let response = self
            .post(&format!("{}/api/records", self.base_url))
            .json(record)
            .send()?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            return Err(DepositError::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let body: Value = response.json()?;
        let id = body["id"]
            .as_str()
            .ok_or(DepositError::MissingField("id"))?
            .to_string();
        let files_url = body["links"]["files"]
            .as_str()
            .ok_or(DepositError::MissingField("links.files"))?
            .to_string();

        tracing::info!(draft = %id, "created draft record");
        Ok(Draft { id, files_url })
    }

    /// Upload one file to a draft: register the entry by key, PUT the
    /// content, commit. The whole sequence retries with exponential
    /// backoff (capped at 60s) on transport errors; HTTP-level errors
    /// propagate immediately.
    pub fn upload_file(&self, files_url: &str, path: &Path) -> Result<()> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DepositError::BadFileName(path.to_path_buf()))?
            .to_string();

        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::info!(file = %filename, attempt, "uploading");
            match self.try_upload(files_url, path, &filename) {
                Ok(()) => {
                    tracing::info!(file = %filename, "uploaded");
                    return Ok(());
                }
                Err(DepositError::Http(e))
                    if is_transient(&e) && attempt < self.max_attempts =>
                {
                    let wait = backoff(attempt);
                    tracing::warn!(
                        file = %filename,
                        error = %e,
                        retry_in_secs = wait.as_secs(),
                        "network error, will retry"
                    );
                    std::thread::sleep(wait);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn try_upload(&self, files_url: &str, path: &Path, filename: &str) -> Result<()> {
        // Register the file entry by key.
        let response = self
            .post(files_url)
            .json(&json!([{ "key": filename }]))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DepositError::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        let body: Value = response.json()?;

        // The register response lists every entry on the draft, so pick
        // ours by key rather than taking the first.
        let entry = body["entries"]
            .as_array()
            .and_then(|entries| entries.iter().find(|e| e["key"] == filename))
            .ok_or(DepositError::MissingField("entries"))?;
        let content_url = entry["links"]["content"]
            .as_str()
            .ok_or(DepositError::MissingField("entries.links.content"))?;
        let commit_url = entry["links"]["commit"]
            .as_str()
            .ok_or(DepositError::MissingField("entries.links.commit"))?;

        // Stream the content.
        let file = std::fs::File::open(path)?;
        let response = self
            .http
            .put(content_url)
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .timeout(CONTENT_TIMEOUT)
            .body(file)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DepositError::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        // Commit.
        let response = self.post(commit_url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DepositError::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Publish a draft. Expects HTTP 202; returns the published record id.
    pub fn publish_draft(&self, draft_id: &str) -> Result<String> {
        let url = format!(
            "{}/api/records/{}/draft/actions/publish",
            self.base_url, draft_id
        );
        let response = self.post(&url).send()?;

        let status = response.status();
        if status != reqwest::StatusCode::ACCEPTED {
            return Err(DepositError::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let body: Value = response.json()?;
        let id = body["id"]
            .as_str()
            .ok_or(DepositError::MissingField("id"))?
            .to_string();
        tracing::info!(record = %id, "published");
        Ok(id)
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs((1u64 << (attempt - 1).min(6)).min(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn client_for(server: &mockito::ServerGuard) -> DepositClient {
        DepositClient::new(server.url(), "token123", "TestAgent/1.0").unwrap()
    }

    #[test]
    fn base_url_strips_trailing_api_suffix() {
        let c = DepositClient::new("https://zenodo.org/api", "t", "ua").unwrap();
        assert_eq!(c.base_url(), "https://zenodo.org");

        let c = DepositClient::new("https://sandbox.zenodo.org/", "t", "ua").unwrap();
        assert_eq!(c.base_url(), "https://sandbox.zenodo.org");
    }

    #[test]
    fn create_draft_parses_id_and_files_url() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/records")
            .match_header("authorization", "Bearer token123")
            .match_header("user-agent", "TestAgent/1.0")
            .with_status(201)
            .with_body(
                json!({
                    "id": "abc123",
                    "links": { "files": format!("{}/api/records/abc123/draft/files", server.url()) },
                })
                .to_string(),
            )
            .create();

        let client = client_for(&server);
        let draft = client.create_draft(&json!({ "metadata": {} })).unwrap();
        assert_eq!(draft.id, "abc123");
        assert!(draft.files_url.ends_with("/api/records/abc123/draft/files"));
        mock.assert();
    }

    #[test]
    fn create_draft_error_carries_status_and_body() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/records")
            .with_status(400)
            .with_body("validation failed")
            .create();

        let client = client_for(&server);
        match client.create_draft(&json!({})) {
            Err(DepositError::Api { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "validation failed");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn upload_file_runs_register_put_commit() {
        let mut server = mockito::Server::new();
        let files_url = format!("{}/draft/files", server.url());
        let register = server
            .mock("POST", "/draft/files")
            .with_status(201)
            .with_body(
                json!({
                    "entries": [{
                        "key": "data.csv",
                        "links": {
                            "content": format!("{}/draft/files/data.csv/content", server.url()),
                            "commit": format!("{}/draft/files/data.csv/commit", server.url()),
                        },
                    }],
                })
                .to_string(),
            )
            .create();
        let put = server
            .mock("PUT", "/draft/files/data.csv/content")
            .match_header("content-type", "application/octet-stream")
            .with_status(200)
            .create();
        let commit = server
            .mock("POST", "/draft/files/data.csv/commit")
            .with_status(200)
            .create();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let client = client_for(&server);
        client.upload_file(&files_url, &path).unwrap();
        register.assert();
        put.assert();
        commit.assert();
    }

    #[test]
    fn upload_picks_its_own_entry_when_draft_has_several() {
        let mut server = mockito::Server::new();
        let files_url = format!("{}/draft/files", server.url());
        server
            .mock("POST", "/draft/files")
            .with_status(201)
            .with_body(
                json!({
                    "entries": [
                        {
                            "key": "earlier.csv",
                            "links": {
                                "content": format!("{}/wrong/content", server.url()),
                                "commit": format!("{}/wrong/commit", server.url()),
                            },
                        },
                        {
                            "key": "data.csv",
                            "links": {
                                "content": format!("{}/right/content", server.url()),
                                "commit": format!("{}/right/commit", server.url()),
                            },
                        },
                    ],
                })
                .to_string(),
            )
            .create();
        let put = server.mock("PUT", "/right/content").with_status(200).create();
        let commit = server.mock("POST", "/right/commit").with_status(200).create();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "x").unwrap();

        let client = client_for(&server);
        client.upload_file(&files_url, &path).unwrap();
        put.assert();
        commit.assert();
    }

    #[test]
    fn upload_http_error_does_not_retry() {
        let mut server = mockito::Server::new();
        let files_url = format!("{}/draft/files", server.url());
        let register = server
            .mock("POST", "/draft/files")
            .with_status(403)
            .with_body("Forbidden")
            .expect(1)
            .create();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "x").unwrap();

        let client = client_for(&server);
        match client.upload_file(&files_url, &path) {
            Err(DepositError::Api { status, .. }) => assert_eq!(status, 403),
            other => panic!("expected Api error, got {other:?}"),
        }
        register.assert();
    }

    #[test]
    fn upload_transport_error_retries_then_gives_up() {
        // Nothing listens on port 1; every attempt fails to connect.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "x").unwrap();

        let client = DepositClient::new("https://zenodo.org", "t", "ua")
            .unwrap()
            .with_max_attempts(2);
        let err = client
            .upload_file("http://127.0.0.1:1/draft/files", &path)
            .unwrap_err();
        assert!(matches!(err, DepositError::Http(_)));
    }

    #[test]
    fn publish_draft_expects_202() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/records/draft-id/draft/actions/publish")
            .with_status(202)
            .with_body(json!({ "id": "abc123" }).to_string())
            .create();

        let client = client_for(&server);
        let id = client.publish_draft("draft-id").unwrap();
        assert_eq!(id, "abc123");
        mock.assert();
    }

    #[test]
    fn publish_error_propagates() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/records/draft-id/draft/actions/publish")
            .with_status(400)
            .with_body("Bad request")
            .create();

        let client = client_for(&server);
        assert!(matches!(
            client.publish_draft("draft-id"),
            Err(DepositError::Api { status: 400, .. })
        ));
    }

    #[test]
    fn backoff_doubles_and_caps_at_sixty_seconds() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
        assert_eq!(backoff(3), Duration::from_secs(4));
        assert_eq!(backoff(7), Duration::from_secs(60));
        assert_eq!(backoff(20), Duration::from_secs(60));
    }
}
