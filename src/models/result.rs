//! Normalized analysis result types.
//!
//! The backend has shipped several response shapes over time; everything here
//! is the client-side normal form. `AnalysisResult` is constructed once per
//! successful analyze exchange and replaces any prior result entirely.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Target audience for the AI summary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    Executive,
    Analyst,
    Product,
    Sales,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Executive => "executive",
            Self::Analyst => "analyst",
            Self::Product => "product",
            Self::Sales => "sales",
        }
    }
}

/// Structural profile of the uploaded table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profiling {
    #[serde(default)]
    pub rows: u64,
    #[serde(default)]
    pub columns: u64,
    #[serde(default)]
    pub missing_total: u64,
    /// Column name -> dtype, as reported by the profiler.
    #[serde(default)]
    pub dtypes: BTreeMap<String, String>,
    #[serde(default)]
    pub numeric_columns: Vec<String>,
}

impl Profiling {
    /// True when the profiler reported nothing (used to detect flat-shape
    /// responses that carry rows/columns at the top level instead).
    pub fn is_empty(&self) -> bool {
        self.rows == 0 && self.columns == 0 && self.dtypes.is_empty()
    }
}

/// Time coverage hints for a detected date column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default)]
    pub date_column: Option<String>,
    #[serde(default)]
    pub min_date: Option<String>,
    #[serde(default)]
    pub max_date: Option<String>,
    #[serde(default)]
    pub days_covered: Option<i64>,
    #[serde(default)]
    pub latest_is_recent: Option<bool>,
}

/// Key performance indicators computed by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Kpis {
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub total_columns: Option<u64>,
    #[serde(default)]
    pub missing_pct: Option<f64>,
    #[serde(default)]
    pub duplicate_rows: Option<u64>,
    #[serde(default)]
    pub outliers_total: Option<u64>,
    #[serde(default)]
    pub rows_per_day: Option<f64>,
    #[serde(default)]
    pub worst_outlier_column: Option<String>,
    #[serde(default)]
    pub suspected_keys: Vec<String>,
    #[serde(default)]
    pub cardinality_top3: Vec<(String, u64)>,
    #[serde(default)]
    pub top_variance_numeric_cols: Vec<String>,
    #[serde(default)]
    pub time: Option<TimeWindow>,
}

/// A single x/y point on the fixed line chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisPoint {
    pub x: AxisValue,
    pub y: f64,
}

/// Category axis values arrive as either labels or numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    Number(f64),
    Text(String),
}

/// A named value on the fixed bar/pie charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

/// The legacy fixed chart triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedCharts {
    pub line: Vec<AxisPoint>,
    pub bar: Vec<NamedValue>,
    pub pie: Vec<NamedValue>,
}

/// Chart kind for AI-recommended charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Scatter,
    Histogram,
    Area,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
            Self::Pie => "pie",
            Self::Scatter => "scatter",
            Self::Histogram => "histogram",
            Self::Area => "area",
        }
    }
}

/// Axis/series wiring for an AI-recommended chart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub x_axis: Option<String>,
    #[serde(default)]
    pub y_axis: Option<String>,
    #[serde(default)]
    pub color_by: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_histogram: Option<bool>,
}

/// Who recommended a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendedBy {
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "fallback")]
    Fallback,
}

/// AI narrative attached to a recommended chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartNarrative {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub insights: Vec<String>,
    pub recommended_by: RecommendedBy,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// One AI-recommended chart descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiChart {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    /// Raw data rows; the shape depends on the chart kind.
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub config: ChartConfig,
    pub ai_metadata: ChartNarrative,
}

/// Either the legacy fixed triple or the dynamic AI-recommended mapping.
///
/// Fixed is tried first: a body carrying `line`/`bar`/`pie` is the legacy
/// shape even if extra keys are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartSet {
    Fixed(FixedCharts),
    Ai(BTreeMap<String, AiChart>),
}

/// Story-level metadata accompanying an AI chart set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartMetadata {
    #[serde(default)]
    pub primary_insights: Vec<String>,
    #[serde(default)]
    pub data_story: String,
    #[serde(default)]
    pub overall_confidence: Option<f64>,
}

/// Legacy single-paragraph insight field, still emitted by older backends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Insights {
    #[serde(default)]
    pub summary: Option<String>,
}

/// Short/long-term recommendation lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub short_term: Vec<String>,
    #[serde(default)]
    pub long_term: Vec<String>,
}

impl Recommendations {
    pub fn is_empty(&self) -> bool {
        self.short_term.is_empty() && self.long_term.is_empty()
    }
}

/// Normalized AI narrative summary.
///
/// Every list field is guaranteed to be a real array after normalization
/// (see `analyze::normalize`); absent extended fields stay `None`/empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailedSummary {
    #[serde(default)]
    pub executive_overview: String,
    #[serde(default)]
    pub key_trends: Vec<String>,
    #[serde(default)]
    pub action_items_quick_wins: Vec<String>,
    #[serde(default)]
    pub data_quality_assessment: Option<String>,
    #[serde(default)]
    pub business_implications: Vec<String>,
    #[serde(default)]
    pub recommendations: Option<Recommendations>,
    #[serde(default)]
    pub risk_alerts: Vec<String>,
    #[serde(default)]
    pub predictive_insights: Vec<String>,
    #[serde(default)]
    pub industry_comparison: Option<String>,
}

impl DetailedSummary {
    /// True when there is no narrative content at all.
    pub fn is_empty(&self) -> bool {
        self.executive_overview.is_empty()
            && self.key_trends.is_empty()
            && self.action_items_quick_wins.is_empty()
    }
}

/// The normalized client-side analysis result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub profiling: Profiling,
    #[serde(default)]
    pub kpis: Kpis,
    #[serde(default)]
    pub charts: Option<ChartSet>,
    #[serde(default, alias = "charts_metadata")]
    pub chart_metadata: Option<ChartMetadata>,
    #[serde(default)]
    pub insights: Option<Insights>,
    #[serde(default)]
    pub detailed_summary: Option<DetailedSummary>,
}

impl AnalysisResult {
    /// The executive paragraph: the AI overview, falling back to the legacy
    /// `insights.summary` field.
    pub fn executive_paragraph(&self) -> Option<&str> {
        self.detailed_summary
            .as_ref()
            .map(|s| s.executive_overview.as_str())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.insights
                    .as_ref()
                    .and_then(|i| i.summary.as_deref())
                    .filter(|s| !s.is_empty())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_set_fixed_shape() {
        let json = serde_json::json!({
            "line": [{"x": "2024-01", "y": 10.0}, {"x": 2.0, "y": 12.5}],
            "bar": [{"name": "north", "value": 4.0}],
            "pie": [{"name": "a", "value": 1.0}]
        });
        match serde_json::from_value::<ChartSet>(json).unwrap() {
            ChartSet::Fixed(fixed) => {
                assert_eq!(fixed.line.len(), 2);
                assert!(matches!(fixed.line[0].x, AxisValue::Text(_)));
                assert!(matches!(fixed.line[1].x, AxisValue::Number(_)));
            }
            ChartSet::Ai(_) => panic!("expected fixed chart triple"),
        }
    }

    #[test]
    fn test_chart_set_ai_shape() {
        let json = serde_json::json!({
            "revenue_trend": {
                "type": "line",
                "data": [{"month": "Jan", "revenue": 100}],
                "config": {"x_axis": "month", "y_axis": "revenue"},
                "ai_metadata": {
                    "title": "Revenue trend",
                    "description": "Monthly revenue over time",
                    "insights": ["Revenue is growing"],
                    "recommended_by": "AI",
                    "confidence": 0.9
                }
            }
        });
        match serde_json::from_value::<ChartSet>(json).unwrap() {
            ChartSet::Ai(charts) => {
                let chart = &charts["revenue_trend"];
                assert_eq!(chart.kind, ChartKind::Line);
                assert_eq!(chart.ai_metadata.recommended_by, RecommendedBy::Ai);
            }
            ChartSet::Fixed(_) => panic!("expected AI chart mapping"),
        }
    }

    #[test]
    fn test_executive_paragraph_falls_back_to_insights() {
        let result = AnalysisResult {
            insights: Some(Insights {
                summary: Some("Legacy summary.".to_string()),
            }),
            ..Default::default()
        };
        assert_eq!(result.executive_paragraph(), Some("Legacy summary."));

        let result = AnalysisResult {
            detailed_summary: Some(DetailedSummary {
                executive_overview: "Overview.".to_string(),
                ..Default::default()
            }),
            insights: Some(Insights {
                summary: Some("Legacy summary.".to_string()),
            }),
            ..Default::default()
        };
        assert_eq!(result.executive_paragraph(), Some("Overview."));
    }
}
