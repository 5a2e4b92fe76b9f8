use std::path::PathBuf;

use crate::models::YearMonth;

/// Generate default box plot filename with format: boxplot-{START}-{END}.svg
pub fn default_boxplot_filename(start_year: i32, end_year: i32) -> PathBuf {
    let filename = format!("boxplot-{}-{}.svg", start_year, end_year);
    PathBuf::from("output").join(filename)
}

/// Generate default line plot filename with format: lineplot-{YYYY}-{MM}.svg
pub fn default_lineplot_filename(month: YearMonth) -> PathBuf {
    let filename = format!("lineplot-{:04}-{:02}.svg", month.year, month.month);
    PathBuf::from("output").join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_boxplot_filename() {
        let filename = default_boxplot_filename(2000, 2020);
        let filename_str = filename.to_string_lossy();

        assert!(filename_str.starts_with("output"));
        assert!(filename_str.ends_with("boxplot-2000-2020.svg"));
    }

    #[test]
    fn test_default_lineplot_filename() {
        let filename = default_lineplot_filename(YearMonth::new(2024, 8).unwrap());
        let parts: Vec<String> = filename
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();

        assert_eq!(parts, vec!["output", "lineplot-2024-08.svg"]);
    }
}
