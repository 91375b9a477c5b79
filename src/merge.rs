//! Merger/cleaner: fold newly collected articles into the persisted dataset.
//!
//! Steps, in order:
//!
//! 1. Load the existing dataset (missing file = empty)
//! 2. Concatenate existing rows first, then new rows
//! 3. Drop duplicate keys, keeping the first occurrence
//! 4. Drop rows missing any required column
//! 5. Overwrite the file
//!
//! Because existing rows come first, an article already on disk always wins
//! over a re-fetched copy with the same URL.

use crate::dataset::Dataset;
use crate::error::DatasetError;
use std::path::Path;
use tracing::{info, instrument};

/// Row counts for one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub existing_rows: usize,
    pub new_rows: usize,
    pub duplicates_removed: usize,
    pub incomplete_removed: usize,
    pub total_rows: usize,
}

impl MergeReport {
    /// Rows the merge added on top of what was already on disk.
    pub fn added(&self) -> usize {
        self.total_rows.saturating_sub(self.existing_rows)
    }
}

/// Combine and clean in memory. Pure; see the module docs for the steps.
pub fn combine_and_clean<S: AsRef<str>>(
    existing: Dataset,
    new: Dataset,
    key_column: &str,
    required_columns: &[S],
) -> (Dataset, MergeReport) {
    let existing_rows = existing.len();
    let new_rows = new.len();

    let mut combined = existing.concat(new);
    let duplicates_removed = combined.dedup_by_key(key_column);
    let incomplete_removed = combined.drop_incomplete(required_columns);

    let report = MergeReport {
        existing_rows,
        new_rows,
        duplicates_removed,
        incomplete_removed,
        total_rows: combined.len(),
    };
    (combined, report)
}

/// Load `path`, merge `new` into it and write the result back.
///
/// A missing file is treated as an empty dataset. Any other read or write
/// failure is returned and nothing is reported as merged.
#[instrument(level = "info", skip_all, fields(path = %path.display(), new_rows = new.len()))]
pub async fn merge_and_persist<S: AsRef<str>>(
    path: &Path,
    new: Dataset,
    key_column: &str,
    required_columns: &[S],
) -> Result<MergeReport, DatasetError> {
    let existing = Dataset::load(path).await?;
    let (combined, report) = combine_and_clean(existing, new, key_column, required_columns);
    combined.save(path).await?;

    info!(
        existing = report.existing_rows,
        new = report.new_rows,
        duplicates = report.duplicates_removed,
        incomplete = report.incomplete_removed,
        total = report.total_rows,
        "Combined data saved to {} with {} total articles",
        path.display(),
        report.total_rows
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REQUIRED_COLUMNS;
    use crate::models::ArticleRecord;

    fn record(url: &str, title: &str, content: &str) -> ArticleRecord {
        [("url", url), ("title", title), ("content", content)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_existing_row_wins_on_duplicate() {
        let existing = Dataset::from_records([record("a", "T1", "C1")]);
        let new = Dataset::from_records([record("a", "T2", "C2")]);

        let (merged, report) = combine_and_clean(existing, new, "url", REQUIRED_COLUMNS);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged.rows()[0].get("title"), Some("T1"));
        assert_eq!(merged.rows()[0].get("content"), Some("C1"));
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.added(), 0);
    }

    #[test]
    fn test_incomplete_new_row_dropped_even_if_unique() {
        let existing = Dataset::from_records([record("a", "T1", "C1")]);
        let no_content: ArticleRecord = [("url", "b"), ("title", "T2")].into_iter().collect();
        let no_title: ArticleRecord = [("url", "c"), ("content", "C3")].into_iter().collect();
        let new = Dataset::from_records([no_content, no_title, record("d", "T4", "C4")]);

        let (merged, report) = combine_and_clean(existing, new, "url", REQUIRED_COLUMNS);

        assert_eq!(merged.values("url").collect::<Vec<_>>(), ["a", "d"]);
        assert_eq!(report.incomplete_removed, 2);
        assert_eq!(report.added(), 1);
    }

    #[test]
    fn test_duplicate_removed_before_completeness_filter() {
        let incomplete: ArticleRecord = [("url", "a"), ("title", "T")].into_iter().collect();
        let new = Dataset::from_records([incomplete, record("a", "T", "C")]);

        let (merged, report) = combine_and_clean(Dataset::new(), new, "url", REQUIRED_COLUMNS);

        assert!(merged.is_empty());
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.incomplete_removed, 1);
    }

    #[test]
    fn test_cross_source_scenario() {
        // two queries returning two articles each, one url shared
        let new = Dataset::from_records([
            record("https://x/1", "A", "a"),
            record("https://x/2", "B", "b"),
            record("https://x/2", "B'", "b'"),
            record("https://x/3", "C", "c"),
        ]);
        let (merged, report) = combine_and_clean(Dataset::new(), new, "url", REQUIRED_COLUMNS);
        assert_eq!(report.total_rows, 3);
        assert_eq!(merged.rows()[1].get("title"), Some("B"));
    }

    #[tokio::test]
    async fn test_missing_file_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        let new = Dataset::from_records((0..5).map(|i| record(&format!("u{i}"), "T", "C")));

        let report = merge_and_persist(&path, new, "url", REQUIRED_COLUMNS).await.unwrap();

        assert_eq!(report.existing_rows, 0);
        assert_eq!(report.total_rows, 5);
        assert_eq!(Dataset::load(&path).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_merge_is_idempotent_without_new_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        let new = Dataset::from_records([record("a", "T1", "C1"), record("b", "T2", "C2")]);
        merge_and_persist(&path, new, "url", REQUIRED_COLUMNS).await.unwrap();
        let first = tokio::fs::read(&path).await.unwrap();

        merge_and_persist(&path, Dataset::new(), "url", REQUIRED_COLUMNS).await.unwrap();
        merge_and_persist(&path, Dataset::new(), "url", REQUIRED_COLUMNS).await.unwrap();
        let second = tokio::fs::read(&path).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_second_run_grows_by_net_new_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        merge_and_persist(
            &path,
            Dataset::from_records([record("a", "T1", "C1")]),
            "url",
            REQUIRED_COLUMNS,
        )
        .await
        .unwrap();

        let extra: ArticleRecord = [("url", "c"), ("title", "T3"), ("content", "C3"), ("author", "X")]
            .into_iter()
            .collect();
        let report = merge_and_persist(
            &path,
            Dataset::from_records([record("a", "T2", "C2"), record("b", "T2", "C2"), extra]),
            "url",
            REQUIRED_COLUMNS,
        )
        .await
        .unwrap();

        assert_eq!(report.existing_rows, 1);
        assert_eq!(report.added(), 2);
        let stored = Dataset::load(&path).await.unwrap();
        assert_eq!(stored.values("url").collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(stored.values("title").next(), Some("T1"));
        assert_eq!(stored.columns(), ["url", "title", "content", "author"]);
    }

    #[tokio::test]
    async fn test_unreadable_existing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        tokio::fs::write(&path, "url,title\na,b\nmore,fields,than,header\n")
            .await
            .unwrap();
        let before = tokio::fs::read(&path).await.unwrap();

        let result = merge_and_persist(
            &path,
            Dataset::from_records([record("a", "T", "C")]),
            "url",
            REQUIRED_COLUMNS,
        )
        .await;

        assert!(matches!(result, Err(DatasetError::Csv { .. })));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), before);
    }
}
