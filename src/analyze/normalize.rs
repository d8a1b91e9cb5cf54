//! Response-shape normalization.
//!
//! The backend has returned several shapes over time for both the quick
//! analysis and the AI summary. Every shape decision lives here, with a
//! documented fallback order, so a backend change needs exactly one change
//! point client-side.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{
    AnalysisResult, ChartMetadata, ChartSet, DetailedSummary, Insights, Kpis, Profiling,
    Recommendations,
};

/// Phase 1 response after normalization: the partial result plus the
/// server-issued handle phase 2 refers to.
#[derive(Debug, Clone)]
pub struct QuickAnalysis {
    pub result: AnalysisResult,
    /// `upload_id`, falling back to `content_hash` for backends that key
    /// retained uploads by digest instead.
    pub upload_handle: Option<String>,
}

/// Decode a field into `T`, treating absent or mis-shaped values as default.
fn decode_or_default<T: DeserializeOwned + Default>(value: Option<&Value>) -> T {
    value
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Decode an optional field, dropping it entirely when mis-shaped.
fn decode_opt<T: DeserializeOwned>(value: Option<&Value>) -> Option<T> {
    value.cloned().and_then(|v| serde_json::from_value(v).ok())
}

/// Coerce a JSON field into a list of strings. Anything that is not an
/// array (null, a bare string, a number) becomes an empty list; non-string
/// items inside an array are dropped.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn opt_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Loose presence check: a field counts as present when it carries a value
/// (empty lists count, nulls and empty strings do not).
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Decode an AI-summary body into a `DetailedSummary`.
///
/// Shape detection, in order:
/// 1. The structured shape - any of `executive_overview`, `key_trends` or
///    `action_items_quick_wins` present. Every list field is coerced to a
///    real array, extended fields included.
/// 2. A bare `{summary}` string, wrapped as the executive overview with
///    empty lists.
/// 3. Anything else: no summary (the caller keeps what phase 1 returned).
pub fn detailed_summary_from_value(body: &Value) -> Option<DetailedSummary> {
    let structured = is_present(body.get("executive_overview"))
        || is_present(body.get("key_trends"))
        || is_present(body.get("action_items_quick_wins"));

    if structured {
        let recommendations = body
            .get("recommendations")
            .map(|r| Recommendations {
                short_term: string_list(r.get("short_term")),
                long_term: string_list(r.get("long_term")),
            })
            .filter(|r| !r.is_empty());

        return Some(DetailedSummary {
            executive_overview: body
                .get("executive_overview")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            key_trends: string_list(body.get("key_trends")),
            action_items_quick_wins: string_list(body.get("action_items_quick_wins")),
            data_quality_assessment: opt_string(body.get("data_quality_assessment")),
            business_implications: string_list(body.get("business_implications")),
            recommendations,
            risk_alerts: string_list(body.get("risk_alerts")),
            predictive_insights: string_list(body.get("predictive_insights")),
            industry_comparison: opt_string(body.get("industry_comparison")),
        });
    }

    if let Some(summary) = body.get("summary").and_then(|v| v.as_str()) {
        return Some(DetailedSummary {
            executive_overview: summary.to_string(),
            ..Default::default()
        });
    }

    None
}

/// Normalize a phase-1 response body.
///
/// Two quick-analysis shapes are in the wild: the nested one
/// (`{profiling: {...}, kpis: {...}}`) and a flat one with `rows`/`columns`
/// at the top level. The flat fields are lifted into `Profiling` when the
/// nested object is absent or empty. An embedded `detailed_summary` goes
/// through the same normalization as the phase-2 body.
pub fn quick_analysis_from_value(body: &Value) -> QuickAnalysis {
    let mut profiling: Profiling = decode_or_default(body.get("profiling"));
    if profiling.is_empty() {
        if let Some(rows) = body.get("rows").and_then(Value::as_u64) {
            profiling.rows = rows;
        }
        if let Some(columns) = body.get("columns").and_then(Value::as_u64) {
            profiling.columns = columns;
        }
        if let Some(missing) = body.get("missing_total").and_then(Value::as_u64) {
            profiling.missing_total = missing;
        }
        if profiling.numeric_columns.is_empty() {
            profiling.numeric_columns = string_list(body.get("numeric_columns"));
        }
    }

    let kpis: Kpis = decode_or_default(body.get("kpis"));
    let charts: Option<ChartSet> = decode_opt(body.get("charts"));
    let chart_metadata: Option<ChartMetadata> = decode_opt(body.get("chart_metadata"))
        .or_else(|| decode_opt(body.get("charts_metadata")));
    let insights: Option<Insights> = decode_opt(body.get("insights"));
    let detailed_summary = body
        .get("detailed_summary")
        .and_then(detailed_summary_from_value);

    let upload_handle =
        opt_string(body.get("upload_id")).or_else(|| opt_string(body.get("content_hash")));

    QuickAnalysis {
        result: AnalysisResult {
            profiling,
            kpis,
            charts,
            chart_metadata,
            insights,
            detailed_summary,
        },
        upload_handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_summary_is_wrapped() {
        let summary = detailed_summary_from_value(&json!({"summary": "X"})).unwrap();
        assert_eq!(summary.executive_overview, "X");
        assert!(summary.key_trends.is_empty());
        assert!(summary.action_items_quick_wins.is_empty());
    }

    #[test]
    fn test_structured_shape_passes_through() {
        let body = json!({
            "executive_overview": "Revenue grew.",
            "key_trends": ["t1", "t2"],
            "action_items_quick_wins": ["w1"]
        });
        let summary = detailed_summary_from_value(&body).unwrap();
        assert_eq!(summary.executive_overview, "Revenue grew.");
        assert_eq!(summary.key_trends, vec!["t1", "t2"]);
        assert_eq!(summary.action_items_quick_wins, vec!["w1"]);
    }

    #[test]
    fn test_non_array_lists_are_coerced() {
        // key_trends as null and as a bare string both normalize to [].
        for trends in [json!(null), json!("upwards")] {
            let body = json!({
                "executive_overview": "O",
                "key_trends": trends,
                "action_items_quick_wins": 7
            });
            let summary = detailed_summary_from_value(&body).unwrap();
            assert!(summary.key_trends.is_empty());
            assert!(summary.action_items_quick_wins.is_empty());
        }
    }

    #[test]
    fn test_extended_fields_are_normalized() {
        let body = json!({
            "executive_overview": "O",
            "key_trends": [],
            "action_items_quick_wins": [],
            "data_quality_assessment": "Mostly clean",
            "business_implications": ["margin pressure"],
            "recommendations": {"short_term": ["fix nulls"], "long_term": "automate"},
            "risk_alerts": ["churn risk"],
            "predictive_insights": null,
            "industry_comparison": ""
        });
        let summary = detailed_summary_from_value(&body).unwrap();
        assert_eq!(summary.data_quality_assessment.as_deref(), Some("Mostly clean"));
        assert_eq!(summary.business_implications, vec!["margin pressure"]);
        let recs = summary.recommendations.unwrap();
        assert_eq!(recs.short_term, vec!["fix nulls"]);
        // A mis-shaped long_term list coerces to empty rather than failing.
        assert!(recs.long_term.is_empty());
        assert_eq!(summary.risk_alerts, vec!["churn risk"]);
        assert!(summary.predictive_insights.is_empty());
        // Empty strings do not survive as extended fields.
        assert!(summary.industry_comparison.is_none());
    }

    #[test]
    fn test_unrecognized_shape_is_absent() {
        assert!(detailed_summary_from_value(&json!({"foo": "bar"})).is_none());
        assert!(detailed_summary_from_value(&json!({"summary": 42})).is_none());
        // Null-only structured fields do not count as the structured shape.
        assert!(detailed_summary_from_value(&json!({"executive_overview": null})).is_none());
    }

    #[test]
    fn test_quick_nested_shape() {
        let body = json!({
            "profiling": {"rows": 10, "columns": 3, "missing_total": 1},
            "kpis": {"total_rows": 10, "missing_pct": 0.5},
            "upload_id": "u-1"
        });
        let quick = quick_analysis_from_value(&body);
        assert_eq!(quick.result.profiling.rows, 10);
        assert_eq!(quick.result.kpis.total_rows, Some(10));
        assert_eq!(quick.upload_handle.as_deref(), Some("u-1"));
    }

    #[test]
    fn test_quick_flat_shape_lifts_counts() {
        let body = json!({"rows": 120, "columns": 5, "upload_id": "abc"});
        let quick = quick_analysis_from_value(&body);
        assert_eq!(quick.result.profiling.rows, 120);
        assert_eq!(quick.result.profiling.columns, 5);
        assert_eq!(quick.upload_handle.as_deref(), Some("abc"));
    }

    #[test]
    fn test_quick_prefers_upload_id_over_content_hash() {
        let body = json!({"upload_id": "u-1", "content_hash": "deadbeef"});
        assert_eq!(
            quick_analysis_from_value(&body).upload_handle.as_deref(),
            Some("u-1")
        );

        let body = json!({"content_hash": "deadbeef"});
        assert_eq!(
            quick_analysis_from_value(&body).upload_handle.as_deref(),
            Some("deadbeef")
        );
    }

    #[test]
    fn test_quick_embedded_summary_is_normalized() {
        let body = json!({
            "profiling": {"rows": 1, "columns": 1},
            "detailed_summary": {"summary": "From phase one."}
        });
        let quick = quick_analysis_from_value(&body);
        let summary = quick.result.detailed_summary.unwrap();
        assert_eq!(summary.executive_overview, "From phase one.");
    }

    #[test]
    fn test_quick_misshaped_charts_are_dropped() {
        let body = json!({
            "profiling": {"rows": 1, "columns": 1},
            "charts": "not a chart set"
        });
        let quick = quick_analysis_from_value(&body);
        assert!(quick.result.charts.is_none());
        assert_eq!(quick.result.profiling.rows, 1);
    }
}
