use crate::domain::model::{EmailMessage, Record, ReportBundle};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 處理單筆錯誤資料列的方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowErrorPolicy {
    #[default]
    Abort,
    Skip,
}

pub trait ConfigProvider: Send + Sync {
    fn sender(&self) -> &str;
    fn subject(&self) -> &str;
    fn body(&self) -> &str;
    fn row_error_policy(&self) -> RowErrorPolicy;
}

/// Upstream content-graph query.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Record>>;
}

/// Downstream mail delivery. Returns where the message ended up.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<ReportBundle>;
    async fn load(&self, result: ReportBundle) -> Result<String>;
}
