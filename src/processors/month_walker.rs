use chrono::NaiveDate;
use tracing::{error, info, info_span, Instrument, Span};

use crate::error::FetchError;
use crate::models::{WeatherDataset, YearMonth};
use crate::readers::{DayTableParser, PageSource, PageStats};
use crate::utils::progress::ProgressReporter;

#[derive(Debug)]
pub enum StopReason {
    /// A page repeated a date already seen in this session.
    DuplicateDetected,
    /// The cursor moved past January of the earliest year.
    EarliestBoundary,
    /// The page holding the newest known date has been processed.
    ReachedKnownData,
    /// Fetching a page failed; everything merged before it is kept.
    FetchFailed(FetchError),
}

#[derive(Debug)]
pub struct WalkReport {
    pub dataset: WeatherDataset,
    pub pages_walked: usize,
    pub last_month: Option<YearMonth>,
    pub stats: PageStats,
    pub stop: StopReason,
}

impl WalkReport {
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match &self.stop {
            StopReason::FetchFailed(e) => Some(e),
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        let reason = match &self.stop {
            StopReason::DuplicateDetected => "source repeated a known date".to_string(),
            StopReason::EarliestBoundary => "earliest year reached".to_string(),
            StopReason::ReachedKnownData => "caught up with stored data".to_string(),
            StopReason::FetchFailed(e) => format!("fetch failed: {}", e),
        };

        let mut summary = String::new();
        summary.push_str("=== Scrape Report ===\n");
        summary.push_str(&format!("Pages walked: {}\n", self.pages_walked));
        if let Some(month) = self.last_month {
            summary.push_str(&format!("Oldest page: {}\n", month));
        }
        summary.push_str(&format!("Days collected: {}\n", self.dataset.len()));
        if let (Some(first), Some(last)) = (self.dataset.earliest_date(), self.dataset.latest_date())
        {
            summary.push_str(&format!("Date range: {} to {}\n", first, last));
        }
        summary.push_str(&format!(
            "Rows dropped: {} (outside month: {}, rejected markers: {})\n",
            self.stats.rows_dropped, self.stats.rows_outside_month, self.stats.markers_rejected
        ));
        summary.push_str(&format!(
            "Cells without a number: {}\n",
            self.stats.cells_defaulted
        ));
        summary.push_str(&format!("Stopped: {}\n", reason));
        summary
    }
}

/// Walks month pages backward from a start month, one page at a time.
pub struct MonthWalker<S: PageSource> {
    source: S,
    parser: DayTableParser,
    earliest: YearMonth,
    span: Span,
}

impl<S: PageSource> MonthWalker<S> {
    /// `earliest_year` bounds the walk even if the source never repeats itself.
    pub fn new(source: S, parser: DayTableParser, earliest_year: i32) -> Self {
        Self {
            source,
            parser,
            earliest: YearMonth {
                year: earliest_year,
                month: 1,
            },
            span: info_span!("month_walker"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Collect every available day from `start` back to the oldest page.
    pub async fn walk(
        &mut self,
        start: YearMonth,
        progress: Option<&ProgressReporter>,
    ) -> WalkReport {
        let span = self.span.clone();
        self.run(start, None, progress).instrument(span).await
    }

    /// Collect only days newer than `latest_known`.
    ///
    /// The page holding `latest_known` is still parsed in full, since newer
    /// days of that month sit after it on the page; the walk stops after it.
    pub async fn walk_since(
        &mut self,
        start: YearMonth,
        latest_known: NaiveDate,
        progress: Option<&ProgressReporter>,
    ) -> WalkReport {
        let span = self.span.clone();
        let mut report = self
            .run(start, Some(latest_known), progress)
            .instrument(span)
            .await;
        report.dataset.retain_after(latest_known);
        report
    }

    async fn run(
        &mut self,
        start: YearMonth,
        latest_known: Option<NaiveDate>,
        progress: Option<&ProgressReporter>,
    ) -> WalkReport {
        let known_month = latest_known.map(YearMonth::of);
        let mut dataset = WeatherDataset::new();
        let mut stats = PageStats::default();
        let mut pages_walked = 0;
        let mut last_month = None;
        let mut cursor = start;

        info!(%start, earliest = %self.earliest, "Starting walk");

        let stop = loop {
            if cursor < self.earliest {
                info!(%cursor, "Passed earliest boundary");
                break StopReason::EarliestBoundary;
            }

            let page = match self.source.fetch(cursor).await {
                Ok(page) => page,
                Err(e) => {
                    error!(month = %cursor, error = %e, "Fetch failed, aborting walk");
                    break StopReason::FetchFailed(e);
                }
            };
            pages_walked += 1;
            last_month = Some(cursor);

            let outcome = self.parser.parse_markup(&page, Some(cursor));
            let added = dataset.extend_new(outcome.records);
            stats.absorb(&outcome.stats);

            info!(month = %cursor, added, total = dataset.len(), "Finished page");
            if let Some(progress) = progress {
                progress.increment(1);
                progress.set_message(&format!("{} ({} days)", cursor, dataset.len()));
            }

            if outcome.duplicate_detected {
                break StopReason::DuplicateDetected;
            }
            if known_month.is_some_and(|known| cursor <= known) {
                break StopReason::ReachedKnownData;
            }

            cursor = cursor.pred();
        };

        WalkReport {
            dataset,
            pages_walked,
            last_month,
            stats,
            stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ColumnMap, MissingValuePolicy};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves pages produced by a closure and records which months were asked for.
    struct FnSource<F> {
        page: F,
        requested: Mutex<Vec<YearMonth>>,
    }

    impl<F> FnSource<F>
    where
        F: Fn(YearMonth) -> Option<String>,
    {
        fn new(page: F) -> Self {
            Self {
                page,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl<F> PageSource for FnSource<F>
    where
        F: Fn(YearMonth) -> Option<String>,
    {
        async fn fetch(&self, month: YearMonth) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(month);
            (self.page)(month).ok_or(FetchError::Missing {
                year: month.year,
                month: month.month,
            })
        }
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    fn month_page(month: YearMonth, last_day: u32) -> String {
        let rows: String = (1..=last_day)
            .filter_map(|d| NaiveDate::from_ymd_opt(month.year, month.month, d))
            .map(|date| {
                format!(
                    "<tr><th><abbr title=\"{}\">{}</abbr></th><td></td><td>{}.0</td><td>-{}.0</td><td>0.5</td></tr>",
                    date.format("%B %-d, %Y"),
                    date.format("%-d"),
                    date.format("%-d"),
                    date.format("%-d"),
                )
            })
            .collect();
        format!("<table><tbody>{}</tbody></table>", rows)
    }

    fn walker<F>(source: FnSource<F>, earliest_year: i32) -> MonthWalker<FnSource<F>>
    where
        F: Fn(YearMonth) -> Option<String>,
    {
        let parser = DayTableParser::new(ColumnMap::default(), MissingValuePolicy::Zero).unwrap();
        MonthWalker::new(source, parser, earliest_year)
    }

    #[tokio::test]
    async fn test_walk_stops_when_source_wraps() {
        let mut pages = HashMap::new();
        pages.insert(ym(2024, 8), month_page(ym(2024, 8), 31));
        pages.insert(ym(2024, 7), month_page(ym(2024, 7), 31));
        // Asking before the first month serves the first month again
        let source = FnSource::new(move |m: YearMonth| {
            pages.get(&m).or_else(|| pages.get(&ym(2024, 7))).cloned()
        });

        let mut walker = walker(source, 1840);
        let report = walker.walk(ym(2024, 8), None).await;

        assert!(matches!(report.stop, StopReason::DuplicateDetected));
        assert_eq!(report.pages_walked, 3);
        assert_eq!(report.dataset.len(), 62);
        assert_eq!(
            report.dataset.latest_date(),
            NaiveDate::from_ymd_opt(2024, 8, 31)
        );
        assert_eq!(
            report.dataset.earliest_date(),
            NaiveDate::from_ymd_opt(2024, 7, 1)
        );
    }

    #[tokio::test]
    async fn test_walk_terminates_at_earliest_year() {
        let source = FnSource::new(|m: YearMonth| Some(month_page(m, 2)));

        let mut walker = walker(source, 2023);
        let report = walker.walk(ym(2024, 3), None).await;

        assert!(matches!(report.stop, StopReason::EarliestBoundary));
        assert_eq!(report.pages_walked, 15);
        assert_eq!(report.last_month, Some(ym(2023, 1)));
        assert_eq!(report.dataset.len(), 30);

        let requested = walker.source.requested.lock().unwrap().clone();
        assert_eq!(requested[2], ym(2024, 1));
        assert_eq!(requested[3], ym(2023, 12));
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_earlier_pages() {
        let source = FnSource::new(|m: YearMonth| {
            (m == ym(2024, 8)).then(|| month_page(m, 31))
        });

        let mut walker = walker(source, 1840);
        let report = walker.walk(ym(2024, 8), None).await;

        assert!(matches!(
            report.fetch_error(),
            Some(FetchError::Missing { year: 2024, month: 7 })
        ));
        assert_eq!(report.pages_walked, 1);
        assert_eq!(report.dataset.len(), 31);
    }

    #[tokio::test]
    async fn test_same_page_twice_adds_nothing() {
        let page = month_page(ym(2024, 8), 10);
        let source = FnSource::new(move |_m: YearMonth| Some(page.clone()));

        let mut walker = walker(source, 1840);
        let report = walker.walk(ym(2024, 8), None).await;

        assert!(matches!(report.stop, StopReason::DuplicateDetected));
        assert_eq!(report.pages_walked, 2);
        assert_eq!(report.dataset.len(), 10);
    }

    #[tokio::test]
    async fn test_walk_since_returns_only_newer_days() {
        let source = FnSource::new(|m: YearMonth| Some(month_page(m, m.days_in_month())));
        let latest = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();

        let mut walker = walker(source, 1840);
        let report = walker.walk_since(ym(2024, 8), latest, None).await;

        assert!(matches!(report.stop, StopReason::ReachedKnownData));
        assert_eq!(report.pages_walked, 2);
        assert_eq!(report.dataset.len(), 16 + 31);
        assert!(report.dataset.iter_chronological().all(|r| r.date > latest));
        assert_eq!(
            report.dataset.earliest_date(),
            NaiveDate::from_ymd_opt(2024, 7, 16)
        );
    }

    #[tokio::test]
    async fn test_walk_since_within_current_month() {
        let source = FnSource::new(|m: YearMonth| Some(month_page(m, 20)));
        let latest = NaiveDate::from_ymd_opt(2024, 8, 12).unwrap();

        let mut walker = walker(source, 1840);
        let report = walker.walk_since(ym(2024, 8), latest, None).await;

        assert_eq!(report.pages_walked, 1);
        let dates: Vec<u32> = report
            .dataset
            .iter_chronological()
            .map(|r| chrono::Datelike::day(&r.date))
            .collect();
        assert_eq!(dates, (13..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_report_summary() {
        let source = FnSource::new(|m: YearMonth| {
            (m == ym(2024, 8)).then(|| {
                month_page(m, 3).replace(
                    "</tbody>",
                    "<tr><th>Avg</th><td></td><td>1.0</td><td>-1.0</td><td>0.5</td></tr></tbody>",
                )
            })
        });
        let mut walker = walker(source, 1840);
        let report = walker.walk(ym(2024, 8), None).await;

        // Footer rows are skipped, not reported as losses
        assert_eq!(report.stats.rows_unmarked, 1);
        let summary = report.summary();
        assert!(summary.contains("Rows dropped: 0"));
        assert!(summary.contains("Pages walked: 1"));
        assert!(summary.contains("Days collected: 3"));
        assert!(summary.contains("fetch failed"));
    }
}
