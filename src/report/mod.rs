//! Result presentation: terminal rendering and PDF export.

mod outline;
mod pdf;

pub use outline::{build_outline, Block, REPORT_TITLE};
pub use pdf::render_pdf;

use std::path::Path;

use console::style;

use crate::models::{AnalysisResult, ChartSet};
use crate::utils::format_size;

/// Render the normalized result to the terminal.
pub fn print_result(result: &AnalysisResult) {
    let p = &result.profiling;
    println!("\n{}", style("Data Profile").bold());
    println!("{}", "-".repeat(50));
    println!("  {:<18} {}", "Rows", p.rows);
    println!("  {:<18} {}", "Columns", p.columns);
    println!("  {:<18} {}", "Missing values", p.missing_total);
    if !p.numeric_columns.is_empty() {
        let shown: Vec<&str> = p.numeric_columns.iter().take(8).map(String::as_str).collect();
        println!("  {:<18} {}", "Numeric columns", shown.join(", "));
    }

    let k = &result.kpis;
    println!("\n{}", style("Key Performance Indicators").bold());
    println!("{}", "-".repeat(50));
    println!("  {:<18} {}", "Total rows", k.total_rows.unwrap_or(p.rows));
    println!(
        "  {:<18} {}",
        "Total columns",
        k.total_columns.unwrap_or(p.columns)
    );
    if let Some(missing_pct) = k.missing_pct {
        println!("  {:<18} {}%", "Missing", missing_pct);
    }
    if let Some(duplicates) = k.duplicate_rows {
        println!("  {:<18} {}", "Duplicate rows", duplicates);
    }
    if let Some(outliers) = k.outliers_total {
        println!("  {:<18} {}", "Outliers", outliers);
    }
    if let Some(rows_per_day) = k.rows_per_day {
        println!("  {:<18} {:.1}", "Rows/day", rows_per_day);
    }
    if !k.top_variance_numeric_cols.is_empty() {
        println!(
            "  {:<18} {}",
            "High variance",
            k.top_variance_numeric_cols.join(", ")
        );
    }
    if let Some(time) = &k.time {
        if let (Some(min), Some(max)) = (&time.min_date, &time.max_date) {
            let days = time
                .days_covered
                .map(|d| format!(" ({} days)", d))
                .unwrap_or_default();
            println!("  {:<18} {} → {}{}", "Time range", min, max, days);
        }
    }

    match &result.charts {
        Some(ChartSet::Fixed(fixed)) => {
            println!("\n{}", style("Charts").bold());
            println!("{}", "-".repeat(50));
            println!(
                "  line: {} points, bar: {} bars, pie: {} slices",
                fixed.line.len(),
                fixed.bar.len(),
                fixed.pie.len()
            );
        }
        Some(ChartSet::Ai(charts)) if !charts.is_empty() => {
            println!("\n{}", style("AI Recommended Charts").bold());
            println!("{}", "-".repeat(50));
            for (name, chart) in charts {
                let confidence = chart
                    .ai_metadata
                    .confidence
                    .map(|c| format!(" ({:.0}% confidence)", c * 100.0))
                    .unwrap_or_default();
                println!(
                    "  {:<20} {} [{}]{}",
                    name,
                    chart.ai_metadata.title,
                    chart.kind.as_str(),
                    confidence
                );
                for insight in chart.ai_metadata.insights.iter().take(2) {
                    println!("    {} {}", style("•").dim(), insight);
                }
            }
            if let Some(meta) = &result.chart_metadata {
                if !meta.data_story.is_empty() {
                    println!("  {}", style(&meta.data_story).dim());
                }
            }
        }
        _ => {}
    }

    if let Some(text) = result.executive_paragraph() {
        println!("\n{}", style("AI Executive Summary").bold());
        println!("{}", "-".repeat(50));
        println!("  {}", text);
    }

    if let Some(summary) = &result.detailed_summary {
        print_list("Key Trends", &summary.key_trends);
        print_list("Quick Wins", &summary.action_items_quick_wins);
        if let Some(quality) = summary
            .data_quality_assessment
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            println!("\n{}", style("Data Quality Assessment").bold());
            println!("{}", "-".repeat(50));
            println!("  {}", quality);
        }
        print_list("Business Implications", &summary.business_implications);
        if let Some(recs) = summary.recommendations.as_ref().filter(|r| !r.is_empty()) {
            print_list("Short-Term Recommendations", &recs.short_term);
            print_list("Long-Term Recommendations", &recs.long_term);
        }
        print_list("Risk Alerts", &summary.risk_alerts);
        print_list("Predictive Insights", &summary.predictive_insights);
        if let Some(comparison) = summary
            .industry_comparison
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            println!("\n{}", style("Industry Comparison").bold());
            println!("{}", "-".repeat(50));
            println!("  {}", comparison);
        }
    }
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{}", style(title).bold());
    println!("{}", "-".repeat(50));
    for item in items {
        println!("  {} {}", style("•").cyan(), item);
    }
}

/// Export the result as a text-only PDF.
pub fn export_pdf(result: &AnalysisResult, path: &Path) -> anyhow::Result<()> {
    let blocks = build_outline(result);
    let bytes = render_pdf(&blocks)?;
    std::fs::write(path, &bytes)?;
    println!(
        "{} Wrote {} ({})",
        style("✓").green(),
        path.display(),
        format_size(bytes.len() as u64)
    );
    Ok(())
}
