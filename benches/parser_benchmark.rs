use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use weather_processor::models::{WeatherDataset, YearMonth};
use weather_processor::processors::IntegrityChecker;
use weather_processor::readers::markup;
use weather_processor::readers::DayTableParser;
use weather_processor::settings::{ColumnMap, MissingValuePolicy};

// Build a month page shaped like the source's daily report
fn create_month_page(month: YearMonth) -> String {
    let mut rows = String::new();
    for d in 1..=month.days_in_month() {
        let date = NaiveDate::from_ymd_opt(month.year, month.month, d).unwrap();
        rows.push_str(&format!(
            "<tr><th scope=\"row\"><abbr title=\"{}\">{:02}</abbr></th>\
             <td></td><td>{:.1}</td><td>{:.1}</td><td>{:.1}<span>E</span></td>\
             <td>&nbsp;</td><td>12.4</td><td>0.0</td></tr>",
            date.format("%B %-d, %Y"),
            d,
            10.0 + d as f64 * 0.3,
            -2.0 + d as f64 * 0.2,
            4.0 + d as f64 * 0.25,
        ));
    }
    format!(
        "<html><body><table><thead><tr><th>DAY</th></tr></thead><tbody>{}\
         <tr><th>Sum</th><td></td><td></td><td></td><td></td></tr></tbody></table></body></html>",
        rows
    )
}

fn benchmark_markup_events(c: &mut Criterion) {
    let page = create_month_page(YearMonth::new(2024, 8).unwrap());

    c.bench_function("markup_events", |b| {
        b.iter(|| markup::events(black_box(&page)))
    });
}

fn benchmark_day_table_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("day_table_parser");

    for months in [1u32, 6, 12].iter() {
        let pages: Vec<(YearMonth, String)> = (1..=*months)
            .map(|m| {
                let month = YearMonth::new(2023, m).unwrap();
                (month, create_month_page(month))
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("pages", months), &pages, |b, pages| {
            b.iter(|| {
                let mut parser =
                    DayTableParser::new(ColumnMap::default(), MissingValuePolicy::Zero).unwrap();
                let mut dataset = WeatherDataset::new();
                for (month, page) in pages {
                    let outcome = parser.parse_markup(black_box(page), Some(*month));
                    dataset.extend_new(outcome.records);
                }
                black_box(dataset)
            })
        });
    }

    group.finish();
}

fn benchmark_integrity_checker(c: &mut Criterion) {
    let mut parser = DayTableParser::new(ColumnMap::default(), MissingValuePolicy::Zero).unwrap();
    let dataset: WeatherDataset = (1..=12)
        .flat_map(|m| {
            let month = YearMonth::new(2023, m).unwrap();
            parser
                .parse_markup(&create_month_page(month), Some(month))
                .records
        })
        .collect();

    let checker = IntegrityChecker::new();
    c.bench_function("integrity_check_year", |b| {
        b.iter(|| checker.check_integrity(black_box(&dataset)))
    });
}

criterion_group!(
    benches,
    benchmark_markup_events,
    benchmark_day_table_parser,
    benchmark_integrity_checker
);
criterion_main!(benches);
