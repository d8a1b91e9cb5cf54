//! Data models for the DataPulse client.

mod result;
mod session;
mod usage;

pub use result::{
    AiChart, AnalysisResult, Audience, AxisPoint, AxisValue, ChartConfig, ChartKind,
    ChartMetadata, ChartNarrative, ChartSet, DetailedSummary, FixedCharts, Insights, Kpis,
    NamedValue, Profiling, Recommendations, RecommendedBy, TimeWindow,
};
pub use session::SessionState;
pub use usage::UsageStats;
