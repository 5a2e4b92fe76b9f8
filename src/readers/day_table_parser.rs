//! Table-walk parser for one month page of daily data.
//!
//! The page is consumed as a single pass over [`MarkupEvent`]s. Region
//! membership is kept on an explicit stack instead of independent flags, so a
//! stray close tag can only ever pop regions it actually opened.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, info, info_span, trace, warn, Span};
use validator::Validate;

use crate::error::{ParseError, Result};
use crate::models::{DayRecord, YearMonth};
use crate::readers::markup::{self, MarkupEvent};
use crate::settings::{ColumnMap, MissingValuePolicy};
use crate::utils::constants::{
    ATTR_DATE_MARKER, MARKER_DATE_FORMAT, TAG_DATA_CELL, TAG_DATE_MARKER, TAG_HEADER_CELL,
    TAG_ROW, TAG_ROW_GROUP,
};

/// Markup scopes the parser tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    RowGroup,
    Row,
    HeaderCell,
    DataCell,
}

impl Region {
    pub fn from_tag(name: &str) -> Option<Self> {
        match name {
            TAG_ROW_GROUP => Some(Region::RowGroup),
            TAG_ROW => Some(Region::Row),
            TAG_HEADER_CELL => Some(Region::HeaderCell),
            TAG_DATA_CELL => Some(Region::DataCell),
            _ => None,
        }
    }
}

/// Path a date marker must sit on, innermost last.
const MARKER_PATH: [Region; 3] = [Region::RowGroup, Region::Row, Region::HeaderCell];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    Scanning,
    /// A repeated date was seen; the rest of the page is ignored.
    Halted,
}

#[derive(Debug, Default)]
struct RowAccumulator {
    date: Option<NaiveDate>,
    marker_rejected: bool,
    outside_target: bool,
    cells_seen: usize,
    open_cell: Option<usize>,
    cell_text: String,
    max: Option<f64>,
    min: Option<f64>,
    mean: Option<f64>,
    complete: bool,
}

/// Counters for everything the parser recovered from on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStats {
    pub rows_emitted: usize,
    /// Day rows that carried a marker but could not be turned into a record.
    pub rows_dropped: usize,
    /// Rows with data cells but no date marker, such as the Sum/Avg/Xtrm footer.
    pub rows_unmarked: usize,
    pub rows_outside_month: usize,
    pub markers_rejected: usize,
    pub cells_defaulted: usize,
}

impl PageStats {
    /// Fold another page's counters into these.
    pub fn absorb(&mut self, other: &PageStats) {
        self.rows_emitted += other.rows_emitted;
        self.rows_dropped += other.rows_dropped;
        self.rows_unmarked += other.rows_unmarked;
        self.rows_outside_month += other.rows_outside_month;
        self.markers_rejected += other.markers_rejected;
        self.cells_defaulted += other.cells_defaulted;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOutcome {
    pub records: Vec<DayRecord>,
    pub duplicate_detected: bool,
    pub stats: PageStats,
}

/// Session-scoped parser. Per-page state is rebuilt for every page; the set of
/// dates already seen lives for the whole walk.
pub struct DayTableParser {
    columns: ColumnMap,
    missing: MissingValuePolicy,
    seen: HashSet<NaiveDate>,
    span: Span,
}

impl DayTableParser {
    pub fn new(columns: ColumnMap, missing: MissingValuePolicy) -> Result<Self> {
        columns.validate()?;

        Ok(Self {
            columns,
            missing,
            seen: HashSet::new(),
            span: info_span!("day_table_parser"),
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn has_seen(&self, date: &NaiveDate) -> bool {
        self.seen.contains(date)
    }

    pub fn parse_markup(&mut self, page: &str, target: Option<YearMonth>) -> PageOutcome {
        self.parse_events(markup::events(page), target)
    }

    /// Walk one page. When `target` is given, rows dated outside that month
    /// are counted and dropped.
    pub fn parse_events<I>(&mut self, events: I, target: Option<YearMonth>) -> PageOutcome
    where
        I: IntoIterator<Item = MarkupEvent>,
    {
        let span = self.span.clone();
        let _entered = span.enter();

        let mut walk = PageWalk {
            parser: self,
            target,
            state: WalkState::Scanning,
            stack: Vec::new(),
            row: RowAccumulator::default(),
            outcome: PageOutcome::default(),
        };

        for event in events {
            if walk.state == WalkState::Halted {
                break;
            }
            walk.handle(event);
        }
        if walk.state == WalkState::Scanning {
            // Stream ended with regions still open
            walk.close_to(0);
        }

        let outcome = walk.outcome;
        let stats = &outcome.stats;
        if stats.rows_dropped > 0 || stats.markers_rejected > 0 || stats.rows_outside_month > 0 {
            warn!(
                dropped = stats.rows_dropped,
                outside_month = stats.rows_outside_month,
                rejected_markers = stats.markers_rejected,
                "Page yielded rows that could not be used"
            );
        }
        debug!(
            records = stats.rows_emitted,
            defaulted_cells = stats.cells_defaulted,
            duplicate = outcome.duplicate_detected,
            "Page parsed"
        );

        outcome
    }
}

struct PageWalk<'p> {
    parser: &'p mut DayTableParser,
    target: Option<YearMonth>,
    state: WalkState,
    stack: Vec<Region>,
    row: RowAccumulator,
    outcome: PageOutcome,
}

impl PageWalk<'_> {
    fn handle(&mut self, event: MarkupEvent) {
        match event {
            MarkupEvent::Start { ref name, .. } => match Region::from_tag(name) {
                Some(region) => self.enter(region),
                None if name == TAG_DATE_MARKER && self.stack.ends_with(&MARKER_PATH) => {
                    if let Some(value) = event.attr(ATTR_DATE_MARKER) {
                        self.date_marker(value);
                    }
                }
                None => {}
            },
            MarkupEvent::Text(text) => {
                if self.innermost() == Some(Region::DataCell) {
                    if !self.row.cell_text.is_empty() {
                        self.row.cell_text.push(' ');
                    }
                    self.row.cell_text.push_str(&text);
                }
            }
            MarkupEvent::End { name } => {
                if let Some(region) = Region::from_tag(&name) {
                    self.leave(region);
                }
            }
        }
    }

    fn innermost(&self) -> Option<Region> {
        self.stack.last().copied()
    }

    fn enter(&mut self, region: Region) {
        match region {
            Region::RowGroup => self.stack.push(region),
            Region::Row => {
                // A new row closes a sibling row that was left open
                if matches!(
                    self.innermost(),
                    Some(Region::Row | Region::HeaderCell | Region::DataCell)
                ) {
                    if let Some(position) = self.stack.iter().rposition(|r| *r == Region::Row) {
                        self.close_to(position);
                    }
                }
                self.row = RowAccumulator::default();
                self.stack.push(region);
            }
            Region::HeaderCell | Region::DataCell => {
                // Cells only count directly inside a row
                if self.innermost() != Some(Region::Row) {
                    return;
                }
                if region == Region::DataCell {
                    self.row.open_cell = Some(self.row.cells_seen);
                    self.row.cells_seen += 1;
                    self.row.cell_text.clear();
                }
                self.stack.push(region);
            }
        }
    }

    fn leave(&mut self, region: Region) {
        let Some(position) = self.stack.iter().rposition(|r| *r == region) else {
            return;
        };
        self.close_to(position);
    }

    /// Pop every region above `depth`, innermost first, finishing cells and
    /// rows that were never explicitly closed.
    fn close_to(&mut self, depth: usize) {
        while self.stack.len() > depth {
            match self.stack.pop() {
                Some(Region::DataCell) => self.finish_cell(),
                Some(Region::Row) => self.finish_row(),
                _ => {}
            }
        }
    }

    fn date_marker(&mut self, value: &str) {
        let date = match NaiveDate::parse_from_str(value.trim(), MARKER_DATE_FORMAT) {
            Ok(date) => date,
            Err(source) => {
                let error = ParseError::MarkerDate {
                    value: value.to_string(),
                    source,
                };
                debug!(%error, "Ignoring date marker");
                self.outcome.stats.markers_rejected += 1;
                self.row.marker_rejected = true;
                return;
            }
        };

        if self.parser.seen.contains(&date) {
            info!(%date, "Date already seen, page repeats earlier data");
            self.outcome.duplicate_detected = true;
            self.state = WalkState::Halted;
            return;
        }

        self.parser.seen.insert(date);
        self.row.date = Some(date);
        self.row.outside_target = self.target.is_some_and(|month| !month.contains(date));
    }

    fn finish_cell(&mut self) {
        let Some(column) = self.row.open_cell.take() else {
            return;
        };

        let columns = self.parser.columns;
        if column != columns.max && column != columns.min && column != columns.mean {
            return;
        }

        let text = std::mem::take(&mut self.row.cell_text);
        let token = text.split_whitespace().next();
        let parsed = token
            .and_then(|t| t.parse::<f64>().ok())
            .filter(|v| v.is_finite());

        if parsed.is_none() {
            self.outcome.stats.cells_defaulted += 1;
            let error = ParseError::Cell {
                column,
                text: text.trim().to_string(),
            };
            trace!(%error, "Using missing-value policy");
        }

        let value = self.parser.missing.resolve(parsed);
        if column == columns.max {
            self.row.max = value;
        } else if column == columns.min {
            self.row.min = value;
        } else {
            self.row.mean = value;
            self.row.complete = true;
        }
    }

    fn finish_row(&mut self) {
        let row = std::mem::take(&mut self.row);

        if !row.complete {
            if let Some(date) = row.date {
                debug!(%date, "Dropping row without a mean value");
                self.outcome.stats.rows_dropped += 1;
            }
            return;
        }

        match row.date {
            Some(date) if row.outside_target => {
                debug!(%date, "Dropping row outside requested month");
                self.outcome.stats.rows_outside_month += 1;
            }
            Some(date) => {
                self.outcome
                    .records
                    .push(DayRecord::new(date, row.max, row.min, row.mean));
                self.outcome.stats.rows_emitted += 1;
            }
            None if row.marker_rejected => {
                self.outcome.stats.rows_dropped += 1;
            }
            None => {
                trace!("Skipping row without a date marker");
                self.outcome.stats.rows_unmarked += 1;
            }
        }
    }
}
