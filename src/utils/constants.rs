/// Source station
pub const DEFAULT_STATION_ID: u32 = 27174;
pub const DEFAULT_LOCATION: &str = "Winnipeg, MB";
pub const DEFAULT_BASE_URL: &str = "https://climate.weather.gc.ca/climate_data/daily_data_e.html";
pub const DEFAULT_USER_AGENT: &str = concat!("weather-processor/", env!("CARGO_PKG_VERSION"));

/// First year the source publishes; also the walk's default lower bound.
pub const DEFAULT_EARLIEST_YEAR: i32 = 1840;

/// Network defaults
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Storage defaults
pub const DEFAULT_DATABASE: &str = "weather_data.sqlite";

/// Data-cell positions within a day row
pub const MAX_COLUMN: usize = 1;
pub const MIN_COLUMN: usize = 2;
pub const MEAN_COLUMN: usize = 3;

/// Date marker format, e.g. "August 3, 2024"
pub const MARKER_DATE_FORMAT: &str = "%B %d, %Y";

/// Markup names
pub const TAG_ROW_GROUP: &str = "tbody";
pub const TAG_ROW: &str = "tr";
pub const TAG_HEADER_CELL: &str = "th";
pub const TAG_DATA_CELL: &str = "td";
pub const TAG_DATE_MARKER: &str = "abbr";
pub const ATTR_DATE_MARKER: &str = "title";

/// Temperature constraints
pub const MIN_VALID_TEMP: f64 = -60.0;
pub const MAX_VALID_TEMP: f64 = 50.0;
pub const TEMP_TOLERANCE: f64 = 0.1;
pub const SUSPICIOUS_JUMP: f64 = 20.0;

/// Chart labels
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
pub const CHART_SIZE: (u32, u32) = (1200, 640);
