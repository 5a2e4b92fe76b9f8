use chrono::NaiveDate;

use crate::models::{DayRecord, WeatherDataset};
use crate::utils::constants::{MAX_VALID_TEMP, MIN_VALID_TEMP, SUSPICIOUS_JUMP, TEMP_TOLERANCE};

#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub total_records: usize,
    pub complete_records: usize,
    pub missing_data_records: usize,
    pub zero_triples: usize,
    pub temperature_violations: Vec<TemperatureViolation>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

#[derive(Debug, Clone)]
pub struct TemperatureViolation {
    pub date: NaiveDate,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationType {
    MinGreaterThanMean,
    MeanGreaterThanMax,
    OutOfRange,
    SuspiciousJump,
}

pub struct IntegrityChecker {
    tolerance: f64,
    temperature_jump_threshold: f64,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self {
            tolerance: TEMP_TOLERANCE,
            temperature_jump_threshold: SUSPICIOUS_JUMP,
        }
    }

    /// Check every stored day plus the day-to-day mean series.
    pub fn check_integrity(&self, dataset: &WeatherDataset) -> IntegrityReport {
        let mut report = IntegrityReport {
            total_records: dataset.len(),
            date_range: dataset.earliest_date().zip(dataset.latest_date()),
            ..Default::default()
        };

        let records: Vec<DayRecord> = dataset.iter_chronological().collect();
        for record in &records {
            self.check_record(record, &mut report);
        }
        self.check_time_series_integrity(&records, &mut report);

        report
    }

    fn check_record(&self, record: &DayRecord, report: &mut IntegrityReport) {
        let temps = record.temperatures();

        if temps.is_complete() {
            report.complete_records += 1;
        } else {
            report.missing_data_records += 1;
        }

        // Every field parsed as the zero default; most likely an empty row
        if temps.max == Some(0.0) && temps.min == Some(0.0) && temps.mean == Some(0.0) {
            report.zero_triples += 1;
            return;
        }

        if let (Some(min), Some(mean)) = (temps.min, temps.mean) {
            if min > mean + self.tolerance {
                report.temperature_violations.push(TemperatureViolation {
                    date: record.date,
                    violation_type: ViolationType::MinGreaterThanMean,
                    details: format!("min {} > mean {}", min, mean),
                });
            }
        }
        if let (Some(mean), Some(max)) = (temps.mean, temps.max) {
            if mean > max + self.tolerance {
                report.temperature_violations.push(TemperatureViolation {
                    date: record.date,
                    violation_type: ViolationType::MeanGreaterThanMax,
                    details: format!("mean {} > max {}", mean, max),
                });
            }
        }

        let values = [(temps.min, "min"), (temps.max, "max"), (temps.mean, "mean")];
        for (temp, name) in values {
            if let Some(temp) = temp {
                if !(MIN_VALID_TEMP..=MAX_VALID_TEMP).contains(&temp) {
                    report.temperature_violations.push(TemperatureViolation {
                        date: record.date,
                        violation_type: ViolationType::OutOfRange,
                        details: format!(
                            "{} temperature {} is outside valid range [{}, {}]",
                            name, temp, MIN_VALID_TEMP, MAX_VALID_TEMP
                        ),
                    });
                }
            }
        }
    }

    /// Flag large mean jumps between consecutive calendar days.
    fn check_time_series_integrity(&self, records: &[DayRecord], report: &mut IntegrityReport) {
        for window in records.windows(2) {
            let prev = &window[0];
            let curr = &window[1];

            if prev.date.succ_opt() != Some(curr.date) {
                continue;
            }

            if let (Some(prev_mean), Some(curr_mean)) = (prev.mean_temp, curr.mean_temp) {
                let jump = (curr_mean - prev_mean).abs();
                if jump > self.temperature_jump_threshold {
                    report.temperature_violations.push(TemperatureViolation {
                        date: curr.date,
                        violation_type: ViolationType::SuspiciousJump,
                        details: format!(
                            "mean temperature jumped {:.1}°C from {} to {}",
                            jump, prev.date, curr.date
                        ),
                    });
                }
            }
        }
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();
        let total = report.total_records.max(1) as f64;

        summary.push_str("=== Integrity Check Report ===\n");
        summary.push_str(&format!("Total Records: {}\n", report.total_records));
        if let Some((first, last)) = report.date_range {
            summary.push_str(&format!("Date Range: {} to {}\n", first, last));
        }
        summary.push_str(&format!(
            "Complete Records: {} ({:.1}%)\n",
            report.complete_records,
            100.0 * report.complete_records as f64 / total
        ));
        summary.push_str(&format!(
            "Missing Data Records: {}\n",
            report.missing_data_records
        ));
        summary.push_str(&format!("All-Zero Records: {}\n", report.zero_triples));
        summary.push_str(&format!(
            "\nTemperature Violations: {}\n",
            report.temperature_violations.len()
        ));

        if !report.temperature_violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, violation) in report.temperature_violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {}: {}\n",
                    i + 1,
                    violation.date,
                    violation.details
                ));
            }
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}
