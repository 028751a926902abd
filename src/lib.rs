pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{outbox::OutboxDispatcher, storage::LocalStorage, ContentSource};
pub use config::toml_config::ReportConfig;
pub use crate::core::{
    aggregator::aggregate, etl::EtlEngine, extractor::extract_links, pipeline::LinkReportPipeline,
    renderer::{render_aggregate, render_exhaustive},
};
pub use utils::error::{ReportError, Result};
