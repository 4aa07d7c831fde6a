use criterion::{criterion_group, criterion_main, Criterion};

use mailkpi::report::aggregate;
use mailkpi::report::period::MonthBucket;

const CASE_HEADER: &str = "Date/Time Opened,Closed Date,Status,Age (Days),Knowledge Base Article,Idol Knowledge Link,R&D Incident";
const SURVEY_HEADER: &str = "Case Number,Customer Feed Back Survey: Last Modified Date,Closed Data,OpenText made it easy to handle my case,Satisfied with support experience";

/// A year of cases spread over every day of 2024.
fn synthetic_cases(rows: usize) -> String {
    let mut csv = format!("{CASE_HEADER}\n");
    for i in 0..rows {
        let month = i % 12 + 1;
        let day = i % 28 + 1;
        let closed = if i % 3 == 0 {
            format!("2024-{month:02}-{:02}", (day + 1).min(28))
        } else {
            String::new()
        };
        let status = if closed.is_empty() { "New" } else { "Closed" };
        let kb = if i % 5 == 0 { "KB-1" } else { "" };
        let rd = if i % 7 == 0 { "INC-1" } else { "" };
        csv.push_str(&format!(
            "2024-{month:02}-{day:02} AM09:30,{closed},{status},{},{kb},,{rd}\n",
            i % 60
        ));
    }
    csv
}

fn synthetic_surveys(rows: usize) -> String {
    let mut csv = format!("{SURVEY_HEADER}\n");
    for i in 0..rows {
        let month = i % 12 + 1;
        let day = i % 28 + 1;
        csv.push_str(&format!(
            "C-{},2024-{month:02}-{day:02},2024-{month:02}-{day:02},{},{}\n",
            i / 2,
            i % 11,
            (i + 3) % 11
        ));
    }
    csv
}

fn bench_aggregate(c: &mut Criterion) {
    let cases = synthetic_cases(20_000);
    let surveys = synthetic_surveys(5_000);
    let bucket = MonthBucket {
        year: 2024,
        month: 6,
    };

    c.bench_function("aggregate_current_month", |b| {
        b.iter(|| aggregate(bucket, true, Some(cases.as_bytes()), Some(surveys.as_bytes())).unwrap())
    });

    c.bench_function("aggregate_past_month", |b| {
        b.iter(|| aggregate(bucket, false, Some(cases.as_bytes()), Some(surveys.as_bytes())).unwrap())
    });
}

criterion_group!(benches, bench_aggregate);
criterion_main!(benches);
