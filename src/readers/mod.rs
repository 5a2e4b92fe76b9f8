pub mod day_table_parser;
pub mod markup;
pub mod page_fetcher;

pub use day_table_parser::{DayTableParser, PageOutcome, PageStats, Region};
pub use markup::MarkupEvent;
pub use page_fetcher::{HttpPageFetcher, PageSource};
