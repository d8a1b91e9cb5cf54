//! Printable report outline.
//!
//! The outline is built as plain data so the presence/omission rules are
//! testable without rendering: a section whose backing data is absent or
//! empty never appears, and no empty headings are emitted.

use crate::models::AnalysisResult;

/// Report title used for exports.
pub const REPORT_TITLE: &str = "DataPulse Analysis Report";

/// One printable block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Title(String),
    Heading(String),
    Paragraph(String),
    Bullet(String),
}

fn bullets(blocks: &mut Vec<Block>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    blocks.push(Block::Heading(heading.to_string()));
    for item in items {
        blocks.push(Block::Bullet(item.clone()));
    }
}

/// Serialize the exportable subset of a result into printable blocks.
pub fn build_outline(result: &AnalysisResult) -> Vec<Block> {
    let mut blocks = vec![Block::Title(REPORT_TITLE.to_string())];

    let p = &result.profiling;
    blocks.push(Block::Heading("Data Profile".to_string()));
    blocks.push(Block::Paragraph(format!(
        "Rows: {}    Columns: {}",
        p.rows, p.columns
    )));
    blocks.push(Block::Paragraph(format!("Missing Values: {}", p.missing_total)));
    if !p.numeric_columns.is_empty() {
        let shown: Vec<&str> = p
            .numeric_columns
            .iter()
            .take(12)
            .map(String::as_str)
            .collect();
        blocks.push(Block::Paragraph(format!(
            "Numeric Columns: {}",
            shown.join(", ")
        )));
    }

    let k = &result.kpis;
    blocks.push(Block::Heading("Key Performance Indicators".to_string()));
    blocks.push(Block::Paragraph(format!(
        "Total Rows: {}",
        k.total_rows.unwrap_or(p.rows)
    )));
    blocks.push(Block::Paragraph(format!(
        "Total Columns: {}",
        k.total_columns.unwrap_or(p.columns)
    )));
    if let Some(missing_pct) = k.missing_pct {
        blocks.push(Block::Paragraph(format!("Missing %: {}%", missing_pct)));
    }
    if let Some(duplicates) = k.duplicate_rows {
        blocks.push(Block::Paragraph(format!("Duplicates: {}", duplicates)));
    }
    if let Some(outliers) = k.outliers_total {
        blocks.push(Block::Paragraph(format!("Outliers: {}", outliers)));
    }
    if let Some(rows_per_day) = k.rows_per_day {
        blocks.push(Block::Paragraph(format!("Rows/Day: {:.1}", rows_per_day)));
    }

    // AI narrative: skipped entirely when there is no paragraph and no lists.
    let ai = result.detailed_summary.as_ref();
    let paragraph = result.executive_paragraph();
    let has_lists = ai.map(|s| {
        !s.key_trends.is_empty() || !s.action_items_quick_wins.is_empty()
    });
    if paragraph.is_some() || has_lists == Some(true) {
        blocks.push(Block::Heading("AI Executive Summary".to_string()));
        if let Some(text) = paragraph {
            blocks.push(Block::Paragraph(text.to_string()));
        }
        if let Some(summary) = ai {
            bullets(&mut blocks, "Key Trends", &summary.key_trends);
            bullets(&mut blocks, "Quick Wins", &summary.action_items_quick_wins);
        }
    }

    // Extended narrative fields, each gated on presence.
    if let Some(summary) = ai {
        if let Some(quality) = summary
            .data_quality_assessment
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            blocks.push(Block::Heading("Data Quality Assessment".to_string()));
            blocks.push(Block::Paragraph(quality.to_string()));
        }
        bullets(
            &mut blocks,
            "Business Implications",
            &summary.business_implications,
        );
        if let Some(recs) = summary.recommendations.as_ref().filter(|r| !r.is_empty()) {
            blocks.push(Block::Heading("Recommendations".to_string()));
            bullets(&mut blocks, "Short Term", &recs.short_term);
            bullets(&mut blocks, "Long Term", &recs.long_term);
        }
        bullets(&mut blocks, "Risk Alerts", &summary.risk_alerts);
        bullets(
            &mut blocks,
            "Predictive Insights",
            &summary.predictive_insights,
        );
        if let Some(comparison) = summary
            .industry_comparison
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            blocks.push(Block::Heading("Industry Comparison".to_string()));
            blocks.push(Block::Paragraph(comparison.to_string()));
        }
    }

    blocks
}
