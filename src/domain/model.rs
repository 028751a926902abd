use crate::utils::error::{ReportError, Result};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const COURSE_KEY_FIELD: &str = "h.course_key";
pub const HTML_FIELD: &str = "h.data";
pub const COURSE_TITLE_FIELD: &str = "course_title";
pub const ORGANIZATION_FIELD: &str = "organization";

/// 外部查詢回傳的原始資料列，欄位名稱沿用查詢的 RETURN 子句
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(field.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContentRow {
    pub course_key: String,
    pub html: String,
    pub course_title: String,
    pub organization: String,
}

impl RawContentRow {
    pub fn new(
        course_key: impl Into<String>,
        html: impl Into<String>,
        course_title: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            course_key: course_key.into(),
            html: html.into(),
            course_title: course_title.into(),
            organization: organization.into(),
        }
    }

    /// Reads the four query columns out of a collaborator record.
    ///
    /// Missing columns are an error. A `null` title or organization becomes
    /// an empty string (courses without a display name do exist); a `null`
    /// key or html is rejected.
    pub fn from_record(record: &Record, row_index: usize) -> Result<Self> {
        Ok(Self {
            course_key: required_str(record, COURSE_KEY_FIELD, row_index, false)?,
            html: required_str(record, HTML_FIELD, row_index, false)?,
            course_title: required_str(record, COURSE_TITLE_FIELD, row_index, true)?,
            organization: required_str(record, ORGANIZATION_FIELD, row_index, true)?,
        })
    }
}

fn required_str(record: &Record, field: &str, row_index: usize, nullable: bool) -> Result<String> {
    match record.data.get(field) {
        None => Err(ReportError::MissingFieldError {
            row_index,
            field: field.to_string(),
        }),
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(serde_json::Value::Null) if nullable => Ok(String::new()),
        Some(_) => Err(ReportError::InvalidFieldError {
            row_index,
            field: field.to_string(),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    Exhaustive,
    DomainCounts,
}

impl AggregationMode {
    pub fn label(&self) -> &'static str {
        match self {
            AggregationMode::Exhaustive => "exhaustive",
            AggregationMode::DomainCounts => "domain",
        }
    }
}

pub type LinkSet = IndexSet<String>;
pub type DomainCounts = IndexMap<String, u64>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseLinks {
    Exhaustive(LinkSet),
    DomainCounts(DomainCounts),
}

impl CourseLinks {
    pub fn mode(&self) -> AggregationMode {
        match self {
            CourseLinks::Exhaustive(_) => AggregationMode::Exhaustive,
            CourseLinks::DomainCounts(_) => AggregationMode::DomainCounts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseEntry {
    pub course_title: String,
    pub organization: String,
    pub links: CourseLinks,
}

/// course_key → CourseEntry, iterated in first-seen order
pub type AggregateResult = IndexMap<String, CourseEntry>;

/// transform 階段的產出：兩份報表文字與統計
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBundle {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub exhaustive_courses: usize,
    pub domain_courses: usize,
    pub exhaustive_csv: String,
    pub aggregate_csv: String,
}

/// Call shape accepted by the mail dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
    pub filenames: Vec<String>,
    #[serde(skip)]
    pub attachments: Vec<Vec<u8>>,
}
