//! Prelude for commonly used types and traits in dq-guard.

pub use crate::advisory::{Advisor, Advisory, TemplateAdvisor};
pub use crate::analyzers::LocalAnalyzer;
pub use crate::core::{
    AnalysisMethod, Clock, DqConfig, DqResult, FixedClock, Issue, IssueType, NumericDistribution,
    Severity, SystemClock,
};
pub use crate::dataset::Dataset;
pub use crate::error::{DqError, ErrorContext, Result};
pub use crate::formatters::{
    FormatterConfig, JsonFormatter, MarkdownFormatter, NotebookFormatter, ResultFormatter,
};
pub use crate::logging::LogConfig;
pub use crate::normalize::MetricValue;
pub use crate::pushdown::{
    ColumnSchema, DataFusionExecutor, PushdownAnalyzer, PushdownParser, QueryExecutor,
    SqlPlanGenerator, StatementResult,
};
pub use crate::security::SqlDialect;
