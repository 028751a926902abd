// Adapters layer: concrete implementations of the collaborator ports (row sources, storage, delivery).

pub mod coursegraph;
pub mod file_source;
pub mod outbox;
pub mod storage;

use crate::config::toml_config::{SourceConfig, SourceType};
use crate::core::{Record, RowSource};
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use coursegraph::CourseGraphSource;
use file_source::FileSource;
use std::time::Duration;

/// Row source selected by configuration.
pub enum ContentSource {
    CourseGraph(CourseGraphSource),
    File(FileSource),
}

impl ContentSource {
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        match config.r#type {
            SourceType::CourseGraph => {
                let endpoint = config.endpoint.as_deref().ok_or_else(|| ReportError::MissingConfigError {
                    field: "source.endpoint".to_string(),
                })?;

                let mut source = CourseGraphSource::new(endpoint);
                if let Some(database) = &config.database {
                    source = source.with_database(database.as_str());
                }
                if let Some(username) = &config.username {
                    let password = config.password.clone().unwrap_or_default();
                    source = source.with_credentials(username.as_str(), password);
                }
                if let Some(timeout) = config.timeout_seconds {
                    source = source.with_timeout(Duration::from_secs(timeout));
                }
                Ok(ContentSource::CourseGraph(source))
            }
            SourceType::File => {
                let path = config.path.as_deref().ok_or_else(|| ReportError::MissingConfigError {
                    field: "source.path".to_string(),
                })?;
                Ok(ContentSource::File(FileSource::new(path)))
            }
        }
    }
}

#[async_trait]
impl RowSource for ContentSource {
    async fn fetch(&self) -> Result<Vec<Record>> {
        match self {
            ContentSource::CourseGraph(source) => source.fetch().await,
            ContentSource::File(source) => source.fetch().await,
        }
    }
}
