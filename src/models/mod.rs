pub mod dataset;
pub mod day_record;
pub mod year_month;

pub use dataset::WeatherDataset;
pub use day_record::{DailyTemperatures, DayRecord, DATE_FORMAT};
pub use year_month::YearMonth;
