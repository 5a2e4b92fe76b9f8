use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

use crate::error::{ProcessingError, Result};
use crate::models::{WeatherDataset, YearMonth};
use crate::utils::constants::{CHART_SIZE, MONTH_LABELS};

/// Mean temperatures grouped by calendar month (index 0 is January) over
/// `start_year..=end_year`. Days without a mean are skipped.
pub fn monthly_mean_buckets(
    dataset: &WeatherDataset,
    start_year: i32,
    end_year: i32,
) -> Result<[Vec<f64>; 12]> {
    if start_year > end_year {
        return Err(ProcessingError::InvalidRange(format!(
            "start year {} is after end year {}",
            start_year, end_year
        )));
    }

    let mut buckets: [Vec<f64>; 12] = Default::default();
    for record in dataset.iter_chronological() {
        if !(start_year..=end_year).contains(&record.date.year()) {
            continue;
        }
        if let Some(mean) = record.mean_temp {
            buckets[record.date.month0() as usize].push(mean);
        }
    }

    Ok(buckets)
}

/// Daily means for one month, oldest first.
pub fn daily_means(dataset: &WeatherDataset, month: YearMonth) -> Vec<(NaiveDate, f64)> {
    dataset
        .iter_chronological()
        .filter(|record| month.contains(record.date))
        .filter_map(|record| record.mean_temp.map(|mean| (record.date, mean)))
        .collect()
}

fn value_bounds<'a>(values: impl Iterator<Item = &'a f64>) -> Option<(f64, f64)> {
    values.fold(None, |bounds, &v| match bounds {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn chart_error<E: std::fmt::Display>(e: E) -> ProcessingError {
    ProcessingError::Chart(e.to_string())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Renders month-by-month box plots and single-month line plots as SVG.
pub struct ChartWriter {
    size: (u32, u32),
}

impl ChartWriter {
    pub fn new() -> Self {
        Self { size: CHART_SIZE }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn write_boxplot(
        &self,
        dataset: &WeatherDataset,
        start_year: i32,
        end_year: i32,
        output_path: &Path,
    ) -> Result<()> {
        let buckets = monthly_mean_buckets(dataset, start_year, end_year)?;
        let (lo, hi) = value_bounds(buckets.iter().flatten()).ok_or_else(|| {
            ProcessingError::NoData(format!(
                "no mean temperatures between {} and {}",
                start_year, end_year
            ))
        })?;

        ensure_parent(output_path)?;
        let title = format!("Mean Temperatures {} to {}", start_year, end_year);

        let root = SVGBackend::new(output_path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(
                (1u32..12u32).into_segmented(),
                (lo as f32 - 2.0)..(hi as f32 + 2.0),
            )
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Month")
            .y_desc("Temperature (°C)")
            .x_labels(12)
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(m) | SegmentValue::Exact(m) => MONTH_LABELS
                    .get((*m as usize).wrapping_sub(1))
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                SegmentValue::Last => String::new(),
            })
            .draw()
            .map_err(chart_error)?;

        chart
            .draw_series(
                buckets
                    .iter()
                    .enumerate()
                    .filter(|(_, values)| !values.is_empty())
                    .map(|(i, values)| {
                        let quartiles = Quartiles::new(values.as_slice());
                        Boxplot::new_vertical(SegmentValue::CenterOf(i as u32 + 1), &quartiles)
                            .width(30)
                            .style(BLUE)
                    }),
            )
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
        info!(path = %output_path.display(), "Box plot written");
        Ok(())
    }

    pub fn write_lineplot(
        &self,
        dataset: &WeatherDataset,
        month: YearMonth,
        output_path: &Path,
    ) -> Result<()> {
        let points = daily_means(dataset, month);
        let (lo, hi) = value_bounds(points.iter().map(|(_, mean)| mean))
            .ok_or_else(|| ProcessingError::NoData(format!("no mean temperatures for {}", month)))?;

        ensure_parent(output_path)?;
        let title = format!("Daily Mean Temperatures {}", month);
        let last_day = month.days_in_month();

        let root = SVGBackend::new(output_path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(1u32..last_day, (lo - 2.0)..(hi + 2.0))
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .x_desc("Day of the month")
            .y_desc("Mean temperature (°C)")
            .x_labels(last_day as usize)
            .draw()
            .map_err(chart_error)?;

        let series: Vec<(u32, f64)> = points.iter().map(|(d, mean)| (d.day(), *mean)).collect();

        chart
            .draw_series(LineSeries::new(series.iter().copied(), &RED))
            .map_err(chart_error)?;
        chart
            .draw_series(
                series
                    .iter()
                    .map(|&(day, mean)| Circle::new((day, mean), 4, RED.filled())),
            )
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
        info!(path = %output_path.display(), "Line plot written");
        Ok(())
    }
}

impl Default for ChartWriter {
    fn default() -> Self {
        Self::new()
    }
}
