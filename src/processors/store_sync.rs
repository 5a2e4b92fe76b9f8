//! Writes walk results to the record store.
//!
//! A walk cut short by a fetch failure is never written. `update` resumes from
//! the newest stored date, so storing newer days over a missing month would
//! leave a gap no later update could see.

use tracing::{error, info};

use crate::error::{ProcessingError, Result};
use crate::models::YearMonth;
use crate::processors::month_walker::{MonthWalker, StopReason, WalkReport};
use crate::readers::PageSource;
use crate::utils::progress::ProgressReporter;
use crate::writers::RecordStore;

#[derive(Debug)]
pub struct SyncOutcome {
    pub report: WalkReport,
    pub inserted: usize,
}

fn require_complete(report: WalkReport) -> Result<WalkReport> {
    match report.stop {
        StopReason::FetchFailed(source) => {
            error!(
                pages = report.pages_walked,
                days = report.dataset.len(),
                "Walk incomplete, store left untouched"
            );
            Err(ProcessingError::IncompleteWalk {
                pages: report.pages_walked,
                days: report.dataset.len(),
                source,
            })
        }
        stop => Ok(WalkReport { stop, ..report }),
    }
}

/// Full walk from `start`, replacing everything stored. Nothing is changed
/// unless the walk finished and found at least one day.
pub async fn download_history<S: PageSource>(
    walker: &mut MonthWalker<S>,
    store: &mut RecordStore,
    location: &str,
    start: YearMonth,
    progress: Option<&ProgressReporter>,
) -> Result<SyncOutcome> {
    let report = require_complete(walker.walk(start, progress).await)?;
    if report.dataset.is_empty() {
        return Err(ProcessingError::NoData(
            "download collected no days, stored data left untouched".to_string(),
        ));
    }

    let inserted = store.replace_all(&report.dataset, location)?;
    info!(inserted, pages = report.pages_walked, "Download stored");
    Ok(SyncOutcome { report, inserted })
}

/// Walk back to the newest stored date and insert only the days after it.
/// With an empty store this is a full walk that inserts everything.
pub async fn update_history<S: PageSource>(
    walker: &mut MonthWalker<S>,
    store: &mut RecordStore,
    location: &str,
    start: YearMonth,
    progress: Option<&ProgressReporter>,
) -> Result<SyncOutcome> {
    let report = match store.latest_date()? {
        Some(latest) => {
            info!(%latest, "Updating after newest stored date");
            walker.walk_since(start, latest, progress).await
        }
        None => {
            info!("Store is empty, walking full history");
            walker.walk(start, progress).await
        }
    };
    let report = require_complete(report)?;

    let inserted = store.upsert_many(&report.dataset, location)?;
    info!(inserted, pages = report.pages_walked, "Update stored");
    Ok(SyncOutcome { report, inserted })
}
