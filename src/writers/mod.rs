pub mod chart_writer;
pub mod record_store;

pub use chart_writer::{daily_means, monthly_mean_buckets, ChartWriter};
pub use record_store::{RecordStore, StoreInfo};
