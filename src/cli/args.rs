use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weather-processor")]
#[command(about = "Scrape, store and chart daily temperatures for one weather station")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Settings file (TOML); WEATHER_* environment variables override it"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace the stored data with a full scrape back to the earliest page
    Download,

    /// Scrape only the days newer than the latest stored date
    Update,

    /// Box plot of monthly mean temperatures over a range of years
    BoxPlot {
        #[arg(short, long)]
        start_year: i32,

        #[arg(short, long)]
        end_year: i32,

        #[arg(
            short,
            long,
            help = "Output SVG path [default: output/boxplot-{START}-{END}.svg]"
        )]
        output: Option<PathBuf>,
    },

    /// Line plot of daily mean temperatures for one month
    LinePlot {
        #[arg(short, long)]
        year: i32,

        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,

        #[arg(
            short,
            long,
            help = "Output SVG path [default: output/lineplot-{YYYY}-{MM}.svg]"
        )]
        output: Option<PathBuf>,
    },

    /// Summarize the stored data and run integrity checks on it
    Info,

    /// Write the stored data as JSON (date -> Max/Min/Mean), newest first
    Export {
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Delete every stored row
    Purge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_plot() {
        let cli = Cli::parse_from(["weather-processor", "line-plot", "--year", "2024", "--month", "8"]);
        match cli.command {
            Commands::LinePlot { year, month, output } => {
                assert_eq!((year, month), (2024, 8));
                assert!(output.is_none());
            }
            _ => panic!("expected line-plot"),
        }
    }

    #[test]
    fn test_month_out_of_range_is_rejected() {
        let result =
            Cli::try_parse_from(["weather-processor", "line-plot", "--year", "2024", "--month", "13"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "weather-processor",
            "update",
            "--verbose",
            "--config",
            "weather.toml",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("weather.toml")));
        assert!(matches!(cli.command, Commands::Update));
    }
}
