use crate::core::{Record, RowSource};
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Reads rows exported from the course graph: a JSON array of objects, or
/// a CSV file whose header names the query columns.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn is_csv(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }

    fn parse_json(bytes: &[u8]) -> Result<Vec<Record>> {
        let objects: Vec<HashMap<String, serde_json::Value>> = serde_json::from_slice(bytes)?;
        Ok(objects.into_iter().map(|data| Record { data }).collect())
    }

    fn parse_csv(bytes: &[u8]) -> Result<Vec<Record>> {
        let mut reader = csv::Reader::from_reader(bytes);
        let mut records = Vec::new();

        for row in reader.deserialize::<HashMap<String, String>>() {
            let data = row?
                .into_iter()
                .map(|(column, value)| (column, serde_json::Value::String(value)))
                .collect();
            records.push(Record { data });
        }

        Ok(records)
    }
}

#[async_trait]
impl RowSource for FileSource {
    async fn fetch(&self) -> Result<Vec<Record>> {
        tracing::debug!("Reading content rows from {}", self.path.display());
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            ReportError::ConfigError {
                message: format!("cannot read rows from {}: {}", self.path.display(), e),
            }
        })?;

        let records = if self.is_csv() {
            Self::parse_csv(&bytes)?
        } else {
            Self::parse_json(&bytes)?
        };

        tracing::debug!("Loaded {} rows from file", records.len());
        Ok(records)
    }
}
