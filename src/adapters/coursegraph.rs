use crate::core::{Record, RowSource};
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Every html block below a course whose text mentions an http(s) link.
pub const COURSE_LINKS_QUERY: &str = "MATCH (c:course)-[:PARENT_OF*]->(h:html) \
     WHERE h.data =~ '.*https?://.*' \
     RETURN c.display_name as course_title, c.org as organization, h.course_key, h.data";

pub const DEFAULT_DATABASE: &str = "neo4j";

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: Vec<TxStatement<'a>>,
}

#[derive(Serialize)]
struct TxStatement<'a> {
    statement: &'a str,
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    row: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

/// Course graph client over the HTTP transactional endpoint.
pub struct CourseGraphSource {
    client: Client,
    endpoint: String,
    database: String,
    credentials: Option<(String, String)>,
    timeout: Option<Duration>,
}

impl CourseGraphSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            database: DEFAULT_DATABASE.to_string(),
            credentials: None,
            timeout: None,
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/db/{}/tx/commit",
            self.endpoint.trim_end_matches('/'),
            self.database
        )
    }

    fn into_records(response: TxResponse) -> Result<Vec<Record>> {
        if !response.errors.is_empty() {
            let message = response
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ReportError::QueryError { message });
        }

        let Some(result) = response.results.into_iter().next() else {
            return Ok(Vec::new());
        };

        let records = result
            .data
            .into_iter()
            .map(|tx_row| Record {
                data: result.columns.iter().cloned().zip(tx_row.row).collect(),
            })
            .collect();
        Ok(records)
    }
}

#[async_trait]
impl RowSource for CourseGraphSource {
    async fn fetch(&self) -> Result<Vec<Record>> {
        let url = self.commit_url();
        tracing::debug!("Posting course link query to: {}", url);

        let mut request = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&TxRequest {
                statements: vec![TxStatement {
                    statement: COURSE_LINKS_QUERY,
                }],
            });

        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Course graph response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::QueryError {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let tx_response: TxResponse = response.json().await?;
        Self::into_records(tx_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RawContentRow;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_zips_columns_into_records() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/db/neo4j/tx/commit")
                .body_contains("PARENT_OF");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "results": [{
                        "columns": ["course_title", "organization", "h.course_key", "h.data"],
                        "data": [
                            {"row": ["course1", "edx", "course-v1:I+am+a+test1", "<a href=\"http://a.com\">a</a>"], "meta": []},
                            {"row": ["course2", null, "course-v1:I+am+a+test2", "http://b.com "], "meta": []}
                        ]
                    }],
                    "errors": []
                }));
        });

        let source = CourseGraphSource::new(server.base_url());
        let records = source.fetch().await.unwrap();

        api_mock.assert();
        assert_eq!(records.len(), 2);
        let first = RawContentRow::from_record(&records[0], 0).unwrap();
        assert_eq!(first.course_key, "course-v1:I+am+a+test1");
        let second = RawContentRow::from_record(&records[1], 1).unwrap();
        assert_eq!(second.organization, "");
    }

    #[tokio::test]
    async fn test_fetch_sends_credentials_to_named_database() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/db/coursegraph/tx/commit")
                .header("authorization", "Basic bmVvNGo6c2VjcmV0");
            then.status(200)
                .json_body(serde_json::json!({"results": [], "errors": []}));
        });

        let source = CourseGraphSource::new(format!("{}/", server.base_url()))
            .with_database("coursegraph")
            .with_credentials("neo4j", "secret");
        let records = source.fetch().await.unwrap();

        api_mock.assert();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_reports_query_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/db/neo4j/tx/commit");
            then.status(200).json_body(serde_json::json!({
                "results": [],
                "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "Invalid input"}]
            }));
        });

        let err = CourseGraphSource::new(server.base_url()).fetch().await.unwrap_err();
        match err {
            ReportError::QueryError { message } => {
                assert!(message.contains("Neo.ClientError.Statement.SyntaxError"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_reports_http_failures() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/db/neo4j/tx/commit");
            then.status(401).body("unauthorized");
        });

        let err = CourseGraphSource::new(server.base_url()).fetch().await.unwrap_err();
        assert!(matches!(err, ReportError::QueryError { .. }));
        assert!(err.to_string().contains("401"));
    }
}
