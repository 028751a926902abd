use crate::core::aggregator::{screen_rows, Aggregator};
use crate::core::renderer::{
    aggregate_report_filename, exhaustive_report_filename, render_aggregate, render_exhaustive,
};
use crate::core::{
    AggregationMode, ConfigProvider, Dispatcher, EmailMessage, Pipeline, RawContentRow, Record,
    ReportBundle, RowErrorPolicy, RowSource,
};
use crate::utils::error::Result;
use chrono::{Local, NaiveDate};

pub struct LinkReportPipeline<R: RowSource, D: Dispatcher, C: ConfigProvider> {
    source: R,
    dispatcher: D,
    config: C,
    recipients: Vec<String>,
    report_date: NaiveDate,
}

impl<R: RowSource, D: Dispatcher, C: ConfigProvider> LinkReportPipeline<R, D, C> {
    pub fn new(source: R, dispatcher: D, config: C, recipients: Vec<String>) -> Self {
        Self {
            source,
            dispatcher,
            config,
            recipients,
            report_date: Local::now().date_naive(),
        }
    }

    /// 指定報表日期（預設為執行當天）
    pub fn with_report_date(mut self, report_date: NaiveDate) -> Self {
        self.report_date = report_date;
        self
    }

    fn to_rows(&self, records: &[Record]) -> Result<(Vec<RawContentRow>, usize)> {
        let policy = self.config.row_error_policy();
        let mut rows = Vec::with_capacity(records.len());
        let mut skipped = 0;

        for (index, record) in records.iter().enumerate() {
            match RawContentRow::from_record(record, index) {
                Ok(row) => rows.push(row),
                Err(e) if policy == RowErrorPolicy::Skip => {
                    tracing::warn!("⚠️ Skipping unreadable row: {}", e);
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok((rows, skipped))
    }
}

#[async_trait::async_trait]
impl<R: RowSource, D: Dispatcher, C: ConfigProvider> Pipeline for LinkReportPipeline<R, D, C> {
    async fn extract(&self) -> Result<Vec<Record>> {
        tracing::info!("Querying Course Graph DB...");
        self.source.fetch().await
    }

    async fn transform(&self, data: Vec<Record>) -> Result<ReportBundle> {
        let policy = self.config.row_error_policy();
        let (rows, unreadable) = self.to_rows(&data)?;
        let (rows, malformed) = screen_rows(rows, policy)?;
        let rows_skipped = unreadable + malformed;

        tracing::info!("Generating exhaustive external links spreadsheet...");
        let exhaustive = Aggregator::new(AggregationMode::Exhaustive)
            .with_policy(policy)
            .aggregate(&rows)?;
        let exhaustive_csv = render_exhaustive(&exhaustive)?;

        tracing::info!("Generating aggregate external links spreadsheet...");
        let domains = Aggregator::new(AggregationMode::DomainCounts)
            .with_policy(policy)
            .aggregate(&rows)?;
        let aggregate_csv = render_aggregate(&domains)?;

        Ok(ReportBundle {
            rows_read: data.len(),
            rows_skipped,
            exhaustive_courses: exhaustive.len(),
            domain_courses: domains.len(),
            exhaustive_csv,
            aggregate_csv,
        })
    }

    async fn load(&self, result: ReportBundle) -> Result<String> {
        let message = EmailMessage {
            subject: self.config.subject().to_string(),
            body: self.config.body().to_string(),
            from: self.config.sender().to_string(),
            to: self.recipients.clone(),
            filenames: vec![
                exhaustive_report_filename(self.report_date),
                aggregate_report_filename(self.report_date),
            ],
            attachments: vec![
                result.exhaustive_csv.into_bytes(),
                result.aggregate_csv.into_bytes(),
            ],
        };

        tracing::info!("Emailing spreadsheets...");
        self.dispatcher.send(message).await
    }
}
