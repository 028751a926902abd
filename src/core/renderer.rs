//! Minimal CSV rendering of the two report variants.
//!
//! The format is fixed by the consumers of the report: the title is always
//! wrapped in double quotes, nothing else is escaped, and each course's extra
//! links go on continuation rows that start with three empty columns.

use crate::core::{AggregateResult, AggregationMode, CourseEntry, CourseLinks};
use crate::utils::error::{ReportError, Result};
use chrono::NaiveDate;

pub const EXHAUSTIVE_HEADER: &str = "Course Key,Course Title,Partner,External Links";
pub const AGGREGATE_HEADER: &str = "Course Key,Course Title,Partner,External Domain,Count";

const LINK_REPORT_PREFIX: &str = "external-resource-link-report";
const DOMAIN_REPORT_PREFIX: &str = "external-resource-domain-report";

pub fn exhaustive_report_filename(date: NaiveDate) -> String {
    format!("{}-{}.csv", LINK_REPORT_PREFIX, date.format("%Y-%m-%d"))
}

pub fn aggregate_report_filename(date: NaiveDate) -> String {
    format!("{}-{}.csv", DOMAIN_REPORT_PREFIX, date.format("%Y-%m-%d"))
}

fn mode_mismatch(expected: AggregationMode, entry: &CourseEntry) -> ReportError {
    ReportError::RenderModeMismatch {
        expected: expected.label(),
        found: entry.links.mode().label(),
    }
}

fn push_course_rows<I>(csv: &mut String, course_key: &str, entry: &CourseEntry, cells: I)
where
    I: IntoIterator<Item = String>,
{
    for (i, cell) in cells.into_iter().enumerate() {
        if i == 0 {
            csv.push_str(&format!(
                "{},\"{}\",{},{}\n",
                course_key, entry.course_title, entry.organization, cell
            ));
        } else {
            csv.push_str(&format!(",,,{}\n", cell));
        }
    }
}

pub fn render_exhaustive(result: &AggregateResult) -> Result<String> {
    let mut csv = format!("{}\n", EXHAUSTIVE_HEADER);

    for (course_key, entry) in result {
        let CourseLinks::Exhaustive(links) = &entry.links else {
            return Err(mode_mismatch(AggregationMode::Exhaustive, entry));
        };
        push_course_rows(&mut csv, course_key, entry, links.iter().cloned());
    }

    Ok(csv)
}

pub fn render_aggregate(result: &AggregateResult) -> Result<String> {
    let mut csv = format!("{}\n", AGGREGATE_HEADER);

    for (course_key, entry) in result {
        let CourseLinks::DomainCounts(counts) = &entry.links else {
            return Err(mode_mismatch(AggregationMode::DomainCounts, entry));
        };

        // sort_by 為穩定排序，同次數保留原先順序
        let mut by_count: Vec<(&String, &u64)> = counts.iter().collect();
        by_count.sort_by(|a, b| b.1.cmp(a.1));

        let cells = by_count
            .into_iter()
            .map(|(domain, count)| format!("{},{}", domain, count));
        push_course_rows(&mut csv, course_key, entry, cells);
    }

    Ok(csv)
}
