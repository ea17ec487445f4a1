//! Output rendering
//!
//! Tables for the terminal, JSON and CSV for machines. Every renderer
//! writes to an `io::Write` so the same code serves stdout and files.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use funnelscope_analytics::{
    AnalysisReport, FunnelSummary, QualityWarning, RetentionPoint, UserFunnelRecord,
};
use serde::Serialize;

/// CSV file names written by `--out-dir`
pub const FUNNEL_CSV: &str = "funnel.csv";
pub const WEEKLY_RETENTION_CSV: &str = "weekly_retention.csv";
pub const DAY_RETENTION_CSV: &str = "day_retention.csv";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "unknown format '{}' (expected table, json or csv)",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}

/// Pretty-printed JSON
pub fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn optional_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(timestamp).unwrap_or_default()
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Quote a CSV field when needed
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// Funnel records

pub fn funnel_csv<W: Write>(out: &mut W, records: &[UserFunnelRecord]) -> io::Result<()> {
    writeln!(
        out,
        "user_id,device_category,view_at,add_at,checkout_at,purchase_at,\
         reached_view,reached_add,reached_checkout,reached_purchase,purchase_revenue"
    )?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{}",
            csv_field(&r.user_id),
            r.device_category,
            timestamp(r.view_at),
            optional_timestamp(r.add_at),
            optional_timestamp(r.checkout_at),
            optional_timestamp(r.purchase_at),
            r.reached_view(),
            r.reached_add(),
            r.reached_checkout(),
            r.reached_purchase(),
            optional_number(r.purchase_revenue),
        )?;
    }
    Ok(())
}

pub fn funnel_table<W: Write>(out: &mut W, records: &[UserFunnelRecord]) -> io::Result<()> {
    if records.is_empty() {
        return writeln!(out, "(no data)");
    }

    let mark = |reached: bool| if reached { "x" } else { "-" };
    writeln!(
        out,
        "{:<24} {:<8} {:<20} {:>4} {:>4} {:>4} {:>10}",
        "User", "Device", "Viewed", "Add", "Chk", "Buy", "Revenue"
    )?;
    writeln!(out, "{}", "-".repeat(80))?;
    for r in records {
        writeln!(
            out,
            "{:<24} {:<8} {:<20} {:>4} {:>4} {:>4} {:>10}",
            r.user_id,
            r.device_category,
            r.view_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            mark(r.reached_add()),
            mark(r.reached_checkout()),
            mark(r.reached_purchase()),
            r.purchase_revenue
                .map(|v| format!("{:.2}", v))
                .unwrap_or_default(),
        )?;
    }
    writeln!(out, "{}", "-".repeat(80))?;
    writeln!(out, "{} user(s)", records.len())
}

// Funnel summary

pub fn summary_csv<W: Write>(out: &mut W, summary: &FunnelSummary) -> io::Result<()> {
    writeln!(out, "group,stage,users,step_conversion,overall_conversion")?;
    for group in &summary.groups {
        for stage in &group.stages {
            writeln!(
                out,
                "{},{},{},{},{}",
                group.label(),
                stage.stage,
                stage.users,
                stage.step_conversion,
                stage.overall_conversion
            )?;
        }
    }
    Ok(())
}

pub fn summary_table<W: Write>(out: &mut W, summary: &FunnelSummary) -> io::Result<()> {
    writeln!(
        out,
        "{:<10} {:<16} {:>10} {:>10} {:>10}",
        "Group", "Stage", "Users", "Step %", "Overall %"
    )?;
    writeln!(out, "{}", "-".repeat(60))?;
    for group in &summary.groups {
        for stage in &group.stages {
            writeln!(
                out,
                "{:<10} {:<16} {:>10} {:>9.1}% {:>9.1}%",
                group.label(),
                stage.stage,
                stage.users,
                stage.step_conversion * 100.0,
                stage.overall_conversion * 100.0
            )?;
        }
        writeln!(
            out,
            "{:<10} {:<16} {:>10.2}",
            group.label(),
            "revenue",
            group.purchase_revenue
        )?;
    }
    Ok(())
}

// Retention

pub fn retention_csv<W: Write>(out: &mut W, points: &[RetentionPoint]) -> io::Result<()> {
    writeln!(
        out,
        "cohort_period,offset,device_category,cohort_size,active_users,retention_rate"
    )?;
    for p in points {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            p.cohort_period,
            p.offset,
            p.device_category,
            p.cohort_size,
            p.active_users,
            p.retention_rate
        )?;
    }
    Ok(())
}

pub fn retention_table<W: Write>(
    out: &mut W,
    points: &[RetentionPoint],
    offset_label: &str,
) -> io::Result<()> {
    if points.is_empty() {
        return writeln!(out, "(no cohorts at or above the size threshold)");
    }

    writeln!(
        out,
        "{:<12} {:<8} {:>8} {:>10} {:>10} {:>10}",
        "Cohort", "Device", offset_label, "Size", "Active", "Rate"
    )?;
    writeln!(out, "{}", "-".repeat(63))?;
    for p in points {
        writeln!(
            out,
            "{:<12} {:<8} {:>8} {:>10} {:>10} {:>9.1}%",
            p.cohort_period.to_string(),
            p.device_category,
            p.offset,
            p.cohort_size,
            p.active_users,
            p.retention_rate * 100.0
        )?;
    }
    Ok(())
}

// Warnings

pub fn warnings_table<W: Write>(out: &mut W, warnings: &[QualityWarning]) -> io::Result<()> {
    if warnings.is_empty() {
        return writeln!(out, "No data-quality warnings");
    }
    writeln!(out, "{} data-quality warning(s):", warnings.len())?;
    for warning in warnings {
        writeln!(out, "  - {}", warning)?;
    }
    Ok(())
}

pub fn warnings_csv<W: Write>(out: &mut W, warnings: &[QualityWarning]) -> io::Result<()> {
    writeln!(out, "warning")?;
    for warning in warnings {
        writeln!(out, "{}", csv_field(&warning.to_string()))?;
    }
    Ok(())
}

// Full report

pub fn report<W: Write>(out: &mut W, report: &AnalysisReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, report)?,
        OutputFormat::Csv => {
            writeln!(out, "# funnel_summary")?;
            summary_csv(out, &report.summary)?;
            writeln!(out, "\n# weekly_retention")?;
            retention_csv(out, &report.weekly_retention)?;
            writeln!(out, "\n# day_retention")?;
            retention_csv(out, &report.day_retention)?;
        }
        OutputFormat::Table => {
            writeln!(out, "Funnel ({} users)", report.funnel.len())?;
            summary_table(out, &report.summary)?;
            writeln!(out, "\nWeekly retention")?;
            retention_table(out, &report.weekly_retention, "Week")?;
            writeln!(out, "\nDay-offset retention")?;
            retention_table(out, &report.day_retention, "Day")?;
            writeln!(out)?;
            warnings_table(out, &report.warnings)?;
        }
    }
    Ok(())
}

/// Write the three output tables as CSV files into `dir`
pub fn write_csv_files(dir: &Path, report: &AnalysisReport) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    write_file(&dir.join(FUNNEL_CSV), |out| funnel_csv(out, &report.funnel))?;
    write_file(&dir.join(WEEKLY_RETENTION_CSV), |out| {
        retention_csv(out, &report.weekly_retention)
    })?;
    write_file(&dir.join(DAY_RETENTION_CSV), |out| {
        retention_csv(out, &report.day_retention)
    })?;

    tracing::info!(dir = %dir.display(), "wrote csv tables");
    Ok(())
}

/// Write one file through a renderer
pub fn write_file<F>(path: &Path, render: F) -> Result<()>
where
    F: FnOnce(&mut io::BufWriter<fs::File>) -> io::Result<()>,
{
    let file =
        fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = io::BufWriter::new(file);
    render(&mut out).with_context(|| format!("failed to write {}", path.display()))?;
    out.flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use funnelscope_analytics::{DeviceCategory, EventType, summarize_funnel};

    fn base() -> DateTime<Utc> {
        DateTime::from_timestamp(1_609_718_400, 0).unwrap()
    }

    fn record(user: &str, add_secs: Option<i64>) -> UserFunnelRecord {
        UserFunnelRecord {
            user_id: user.to_string(),
            device_category: DeviceCategory::Mobile,
            view_at: base(),
            add_at: add_secs.map(|s| base() + Duration::seconds(s)),
            checkout_at: None,
            purchase_at: None,
            purchase_revenue: None,
        }
    }

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("csv".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_funnel_csv() {
        let text = render(|out| funnel_csv(out, &[record("u1", Some(1)), record("a,b", None)]));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("user_id,device_category,view_at"));
        assert_eq!(
            lines[1],
            "u1,mobile,2021-01-04T00:00:00.000000Z,2021-01-04T00:00:01.000000Z,,,true,true,false,false,"
        );
        assert!(lines[2].starts_with("\"a,b\",mobile,"));
    }

    #[test]
    fn test_funnel_table_empty() {
        assert_eq!(render(|out| funnel_table(out, &[])), "(no data)\n");
    }

    #[test]
    fn test_summary_csv() {
        let summary = summarize_funnel(&[record("u1", Some(1)), record("u2", None)]);
        let text = render(|out| summary_csv(out, &summary));

        assert!(text.contains("all,PRODUCT_VIEW,2,1,1\n"));
        assert!(text.contains("all,ADD_TO_CART,1,0.5,0.5\n"));
        assert!(text.contains("mobile,PURCHASE,0,0,0\n"));
    }

    #[test]
    fn test_retention_csv() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
        let points = [RetentionPoint::new(date, 1, DeviceCategory::Desktop, 4, 1)];
        let text = render(|out| retention_csv(out, &points));
        assert_eq!(
            text,
            "cohort_period,offset,device_category,cohort_size,active_users,retention_rate\n\
             2021-01-04,1,desktop,4,1,0.25\n"
        );
    }

    #[test]
    fn test_retention_table() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let points = [RetentionPoint::new(date, 30, DeviceCategory::Mobile, 150, 0)];
        let text = render(|out| retention_table(out, &points, "Day"));
        assert!(text.contains("2021-01-01"));
        assert!(text.contains("0.0%"));
    }

    #[test]
    fn test_warnings() {
        let warnings = [QualityWarning::OrderingViolation {
            user_id: "u1".to_string(),
            stage: EventType::AddToCart,
        }];
        let text = render(|out| warnings_table(out, &warnings));
        assert!(text.starts_with("1 data-quality warning(s):"));
        assert!(text.contains("u1"));
        assert_eq!(render(|out| warnings_table(out, &[])), "No data-quality warnings\n");
    }
}
