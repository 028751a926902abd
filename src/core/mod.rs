pub mod aggregator;
pub mod etl;
pub mod extractor;
pub mod pipeline;
pub mod renderer;

pub use crate::domain::model::{
    AggregateResult, AggregationMode, CourseEntry, CourseLinks, EmailMessage, RawContentRow, Record,
    ReportBundle,
};
pub use crate::domain::ports::{ConfigProvider, Dispatcher, Pipeline, RowErrorPolicy, RowSource, Storage};
pub use crate::utils::error::Result;
