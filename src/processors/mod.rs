pub mod integrity_checker;
pub mod month_walker;
pub mod store_sync;

pub use integrity_checker::{IntegrityChecker, IntegrityReport, TemperatureViolation, ViolationType};
pub use month_walker::{MonthWalker, StopReason, WalkReport};
pub use store_sync::{download_history, update_history, SyncOutcome};
