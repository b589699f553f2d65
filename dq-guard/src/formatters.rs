//! Rendering of analysis results.
//!
//! Formatters read a [`DqResult`] and, optionally, an [`Advisory`]. When no
//! advisory is supplied the report formats fall back to
//! [`TemplateAdvisor`]'s output.
//!
//! - [`JsonFormatter`]: canonical JSON for programmatic consumers
//! - [`MarkdownFormatter`]: the human-readable assessment report
//! - [`NotebookFormatter`]: a Fix-It notebook in Databricks `SOURCE` format
//!
//! # Examples
//!
//! ```rust
//! use dq_guard::formatters::{MarkdownFormatter, ResultFormatter};
//! # use dq_guard::core::{AnalysisMethod, DqResult};
//! # use dq_guard::error::DqError;
//! # let result = DqResult::degenerate(AnalysisMethod::PushDown, &DqError::empty_result("no rows"));
//!
//! let report = MarkdownFormatter::new().format(&result, None).unwrap();
//! assert!(report.starts_with("# Data Quality Assessment Report"));
//! ```

use serde_json::{json, Value};
use std::borrow::Cow;
use std::fmt::Write;
use std::sync::Arc;

use crate::advisory::{Advisory, TemplateAdvisor};
use crate::core::{Clock, DqResult, Issue, SystemClock};
use crate::error::Result;
use crate::normalize::to_canonical_json;

/// Configuration options for formatting results.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include per-column numeric distributions
    pub include_distributions: bool,
    /// Include individual issues
    pub include_issues: bool,
    /// Maximum number of issues to display (`None` for all)
    pub max_issues: Option<usize>,
    /// Whether to include the generation time in reports
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_distributions: true,
            include_issues: true,
            max_issues: None,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Creates a minimal configuration showing only the summary.
    pub fn minimal() -> Self {
        Self {
            include_distributions: false,
            include_issues: false,
            max_issues: Some(0),
            include_timestamps: false,
        }
    }

    /// Creates a detailed configuration showing everything.
    pub fn detailed() -> Self {
        Self::default()
    }

    /// Creates a configuration with stable output, for CI and snapshots.
    pub fn ci() -> Self {
        Self {
            include_timestamps: false,
            ..Self::default()
        }
    }

    pub fn with_distributions(mut self, include: bool) -> Self {
        self.include_distributions = include;
        self
    }

    pub fn with_issues(mut self, include: bool) -> Self {
        self.include_issues = include;
        self
    }

    pub fn with_max_issues(mut self, max: Option<usize>) -> Self {
        self.max_issues = max;
        self
    }

    fn visible_issues<'a>(&self, issues: &'a [Issue]) -> &'a [Issue] {
        if !self.include_issues {
            return &[];
        }
        match self.max_issues {
            Some(max) => &issues[..max.min(issues.len())],
            None => issues,
        }
    }
}

/// Formats an analysis result into a text artifact.
pub trait ResultFormatter {
    /// Formats a result, with its advisory when one is available.
    fn format(&self, result: &DqResult, advisory: Option<&Advisory>) -> Result<String>;
}

fn advisory_or_template<'a>(result: &DqResult, advisory: Option<&'a Advisory>) -> Cow<'a, Advisory> {
    match advisory {
        Some(advisory) => Cow::Borrowed(advisory),
        None => Cow::Owned(TemplateAdvisor::new().build(result)),
    }
}

/// Formats results as JSON.
///
/// Without an advisory the output is the result object itself; with one, the
/// output is `{"result": ..., "advisory": ...}`.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::with_config(FormatterConfig::default())
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn filtered(&self, result: &DqResult) -> Result<Value> {
        let mut value = to_canonical_json(result)?;
        if let Some(object) = value.as_object_mut() {
            if !self.config.include_distributions {
                object.remove("numeric_distribution");
            }
            let visible = self.config.visible_issues(&result.issues);
            if visible.len() != result.issues.len() {
                object.insert("issues".to_string(), serde_json::to_value(visible)?);
            }
        }
        Ok(value)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for JsonFormatter {
    fn format(&self, result: &DqResult, advisory: Option<&Advisory>) -> Result<String> {
        let result = self.filtered(result)?;
        let value = match advisory {
            Some(advisory) => json!({ "result": result, "advisory": advisory }),
            None => result,
        };
        let text = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(text)
    }
}

/// Formats the assessment report in Markdown.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    clock: Arc<dyn Clock>,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self::with_config(FormatterConfig::default())
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the clock used for the report date.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for MarkdownFormatter {
    fn format(&self, result: &DqResult, advisory: Option<&Advisory>) -> Result<String> {
        let advisory = advisory_or_template(result, advisory);
        let mut output = String::new();

        writeln!(output, "# Data Quality Assessment Report")?;
        if self.config.include_timestamps {
            let date = self.clock.now().format("%Y-%m-%d %H:%M:%S");
            writeln!(output, "**Date:** {date}")?;
        }
        writeln!(output, "**DQ Score:** {}", result.dq_score)?;
        if let Some(source) = &result.source {
            writeln!(output, "**Source:** {source} ({})", result.analysis_method)?;
        }
        if let Some(error) = &result.error {
            writeln!(output, "**Analysis Error:** {} ({})", error.message, error.kind)?;
        }
        writeln!(output)?;

        writeln!(output, "## Executive Summary")?;
        writeln!(output, "{}", advisory.summary)?;
        writeln!(output)?;

        writeln!(output, "## Pipeline Health")?;
        writeln!(output, "**Status:** {}", advisory.pipeline_health)?;
        writeln!(output)?;

        writeln!(output, "## Identified Issues")?;
        let visible = self.config.visible_issues(&result.issues);
        for issue in visible {
            writeln!(
                output,
                "- **{}** ({}): {} (Column: {})",
                issue.issue_type, issue.severity, issue.details, issue.column
            )?;
        }
        let hidden = result.issues.len() - visible.len();
        if hidden > 0 {
            writeln!(output, "- ... and {hidden} more")?;
        }

        if self.config.include_distributions && !result.numeric_distribution.is_empty() {
            writeln!(output)?;
            writeln!(output, "## Numeric Distributions")?;
            writeln!(output)?;
            writeln!(output, "| Column | Count | Min | Max | Mean |")?;
            writeln!(output, "|--------|-------|-----|-----|------|")?;
            for (column, dist) in &result.numeric_distribution {
                let mean = dist
                    .mean
                    .map_or_else(|| "-".to_string(), |mean| format!("{mean:.3}"));
                writeln!(
                    output,
                    "| {column} | {} | {} | {} | {mean} |",
                    dist.count, dist.min, dist.max
                )?;
            }
        }

        writeln!(output)?;
        writeln!(output, "## Root Cause Analysis")?;
        writeln!(output, "{}", advisory.root_cause_analysis)?;
        writeln!(output)?;
        writeln!(output, "## Recommendations")?;
        writeln!(output, "### SQL Fixes")?;
        writeln!(output, "```sql")?;
        writeln!(output, "{}", advisory.recommended_sql_fixes)?;
        writeln!(output, "```")?;
        writeln!(output)?;
        writeln!(output, "### Python Fixes")?;
        writeln!(output, "```python")?;
        writeln!(output, "{}", advisory.recommended_python_fixes)?;
        writeln!(output, "```")?;

        Ok(output)
    }
}

const COMMAND_SEPARATOR: &str = "# COMMAND ----------";

/// Formats a Fix-It notebook in Databricks `SOURCE` format.
#[derive(Debug, Clone)]
pub struct NotebookFormatter {
    table_name: String,
}

impl NotebookFormatter {
    pub fn new() -> Self {
        Self {
            table_name: "table_name".to_string(),
        }
    }

    /// Sets the table targeted by the `OPTIMIZE` and `VACUUM` cells.
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }
}

impl Default for NotebookFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for NotebookFormatter {
    fn format(&self, result: &DqResult, advisory: Option<&Advisory>) -> Result<String> {
        let advisory = advisory_or_template(result, advisory);
        let mut output = String::new();

        writeln!(output, "# Databricks notebook source")?;
        writeln!(output, "# MAGIC %md")?;
        writeln!(output, "# # Auto-Generated Fix-It Notebook")?;
        writeln!(output, "# Generated based on DQ Score: {}", result.dq_score)?;
        writeln!(output)?;

        writeln!(output, "{COMMAND_SEPARATOR}")?;
        writeln!(output)?;
        writeln!(output, "# MAGIC %md")?;
        writeln!(output, "## AI Analysis Summary")?;
        writeln!(output, "{}", advisory.summary)?;
        writeln!(output)?;

        writeln!(output, "{COMMAND_SEPARATOR}")?;
        writeln!(output)?;
        writeln!(output, "# MAGIC %sql")?;
        writeln!(output, "-- Recommended SQL Fixes")?;
        writeln!(output, "{}", advisory.recommended_sql_fixes)?;
        writeln!(output)?;

        writeln!(output, "{COMMAND_SEPARATOR}")?;
        writeln!(output)?;
        writeln!(output, "# MAGIC %python")?;
        writeln!(output, "# Recommended Python Fixes")?;
        writeln!(output, "{}", advisory.recommended_python_fixes)?;
        writeln!(output)?;

        writeln!(output, "{COMMAND_SEPARATOR}")?;
        writeln!(output)?;
        writeln!(output, "# MAGIC %sql")?;
        writeln!(output, "-- Delta Optimizations")?;
        for optimization in &advisory.delta_optimizations {
            writeln!(output, "-- {optimization}")?;
            let upper = optimization.to_uppercase();
            if upper.contains("OPTIMIZE") {
                writeln!(output, "OPTIMIZE {};", self.table_name)?;
            }
            if upper.contains("VACUUM") {
                writeln!(output, "VACUUM {};", self.table_name)?;
            }
        }

        Ok(output)
    }
}
