use crate::core::extractor::extract_links;
use crate::core::{AggregateResult, AggregationMode, CourseEntry, CourseLinks, RawContentRow};
use crate::domain::model::{DomainCounts, LinkSet};
use crate::domain::ports::RowErrorPolicy;
use crate::utils::error::{ReportError, Result};
use indexmap::map::Entry;

/// 只處理新格式的課程代碼，舊格式（已封存課程）一律略過
pub const MODERN_COURSE_PREFIX: &str = "course-";

/// Reduces a link to `scheme://host/`.
///
/// The authority is kept exactly as written: no lower-casing, port and
/// user-info included. Path, query and fragment are replaced by one `/`.
pub fn canonical_domain(link: &str) -> Result<String> {
    let malformed = || ReportError::CanonicalizationError {
        link: link.to_string(),
    };

    let (scheme, rest) = link.split_once("://").ok_or_else(malformed)?;
    let authority = rest
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or_default();

    if scheme.is_empty() || authority.is_empty() {
        return Err(malformed());
    }
    // 不成對的 IPv6 括號
    if authority.contains('[') != authority.contains(']') {
        return Err(malformed());
    }

    Ok(format!("{}://{}/", scheme, authority))
}

/// Counts canonical domains over one row's already de-duplicated links.
pub fn count_domains(links: &LinkSet) -> Result<DomainCounts> {
    let mut counts = DomainCounts::new();
    for link in links {
        *counts.entry(canonical_domain(link)?).or_insert(0) += 1;
    }
    Ok(counts)
}

impl CourseLinks {
    fn absorb(&mut self, incoming: CourseLinks) {
        match (self, incoming) {
            (CourseLinks::Exhaustive(links), CourseLinks::Exhaustive(new_links)) => {
                links.extend(new_links);
            }
            (CourseLinks::DomainCounts(counts), CourseLinks::DomainCounts(new_counts)) => {
                for (domain, count) in new_counts {
                    *counts.entry(domain).or_insert(0) += count;
                }
            }
            (current, incoming) => unreachable!(
                "an aggregation only produces {} links, got {}",
                current.mode().label(),
                incoming.mode().label()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    mode: AggregationMode,
    policy: RowErrorPolicy,
}

impl Aggregator {
    pub fn new(mode: AggregationMode) -> Self {
        Self {
            mode,
            policy: RowErrorPolicy::Abort,
        }
    }

    pub fn with_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn aggregate(&self, rows: &[RawContentRow]) -> Result<AggregateResult> {
        rows.iter()
            .enumerate()
            .try_fold(AggregateResult::new(), |acc, (index, row)| {
                self.fold_row(acc, index, row)
            })
    }

    fn fold_row(
        &self,
        mut acc: AggregateResult,
        index: usize,
        row: &RawContentRow,
    ) -> Result<AggregateResult> {
        if !row.course_key.starts_with(MODERN_COURSE_PREFIX) {
            tracing::trace!("Skipping legacy course key {}", row.course_key);
            return Ok(acc);
        }

        let contribution = match self.row_links(row) {
            Ok(Some(links)) => links,
            Ok(None) => return Ok(acc),
            Err(e) if self.policy == RowErrorPolicy::Skip && e.is_row_error() => {
                tracing::warn!("⚠️ Skipping row {} of {}: {}", index, row.course_key, e);
                return Ok(acc);
            }
            Err(e) => return Err(e),
        };

        match acc.entry(row.course_key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(CourseEntry {
                    course_title: row.course_title.clone(),
                    organization: row.organization.clone(),
                    links: contribution,
                });
            }
            Entry::Occupied(mut slot) => slot.get_mut().links.absorb(contribution),
        }

        Ok(acc)
    }

    /// The row's contribution, or `None` when it has no external links.
    fn row_links(&self, row: &RawContentRow) -> Result<Option<CourseLinks>> {
        let links = extract_links(&row.html);
        if links.is_empty() {
            return Ok(None);
        }

        let contribution = match self.mode {
            AggregationMode::Exhaustive => CourseLinks::Exhaustive(links),
            AggregationMode::DomainCounts => CourseLinks::DomainCounts(count_domains(&links)?),
        };
        Ok(Some(contribution))
    }
}

pub fn aggregate(rows: &[RawContentRow], mode: AggregationMode) -> Result<AggregateResult> {
    Aggregator::new(mode).aggregate(rows)
}

/// Decides once which rows survive, before either aggregation runs, so the
/// link report and the domain report are built from the same rows.
///
/// A row whose links cannot be canonicalized fails the batch under
/// `Abort` and is dropped (and counted) under `Skip`. Legacy course keys are
/// passed through untouched; the aggregation ignores them anyway.
pub fn screen_rows(
    rows: Vec<RawContentRow>,
    policy: RowErrorPolicy,
) -> Result<(Vec<RawContentRow>, usize)> {
    let mut kept = Vec::with_capacity(rows.len());
    let mut skipped = 0;

    for (index, row) in rows.into_iter().enumerate() {
        if !row.course_key.starts_with(MODERN_COURSE_PREFIX) {
            kept.push(row);
            continue;
        }
        match count_domains(&extract_links(&row.html)) {
            Ok(_) => kept.push(row),
            Err(e) if policy == RowErrorPolicy::Skip && e.is_row_error() => {
                tracing::warn!("⚠️ Skipping row {} of {}: {}", index, row.course_key, e);
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok((kept, skipped))
}
