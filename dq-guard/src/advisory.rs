//! Remediation advice attached to an analysis result.
//!
//! An [`Advisor`] turns a [`DqResult`] into an [`Advisory`]. The analyzers
//! never read advisories; they exist for reports and notebooks. Model-backed
//! advisors live outside this crate and can hand their raw reply to
//! [`Advisory::from_model_response`]; [`TemplateAdvisor`] is the offline
//! implementation.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, instrument};

use crate::core::DqResult;
use crate::error::{DqError, Result};

/// `pipeline_health` when more than [`AT_RISK_ISSUE_COUNT`] issues were found.
pub const AT_RISK: &str = "At Risk";
pub const HEALTHY: &str = "Healthy";
pub const AT_RISK_ISSUE_COUNT: usize = 2;

/// Fixed-shape remediation advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub root_cause_analysis: String,
    pub pipeline_health: String,
    #[serde(deserialize_with = "text_or_lines")]
    pub recommended_sql_fixes: String,
    #[serde(deserialize_with = "text_or_lines")]
    pub recommended_python_fixes: String,
    #[serde(default)]
    pub delta_optimizations: Vec<String>,
    pub summary: String,
}

// Models answer with either a string or a list of statements.
fn text_or_lines<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrLines {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(match TextOrLines::deserialize(deserializer)? {
        TextOrLines::Text(text) => text,
        TextOrLines::Lines(lines) => lines.join("\n"),
    })
}

impl Advisory {
    /// Parses a model reply, unwrapping a fenced ```json block if present.
    pub fn from_model_response(content: &str) -> Result<Self> {
        let json = match content.split_once("```json") {
            Some((_, rest)) => rest.split_once("```").map_or(rest, |(body, _)| body),
            None => content,
        };
        serde_json::from_str(json.trim())
            .map_err(|e| DqError::Serialization(format!("Invalid advisory response: {e}")))
    }

    /// Returns true when the advisory marks the pipeline as at risk.
    pub fn is_at_risk(&self) -> bool {
        self.pipeline_health == AT_RISK
    }
}

/// Produces advice for an analysis result.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, result: &DqResult) -> Result<Advisory>;
}

/// Rule-based advisor used when no model is available.
#[derive(Debug, Clone, Default)]
pub struct TemplateAdvisor;

impl TemplateAdvisor {
    pub fn new() -> Self {
        Self
    }

    /// Builds the advisory synchronously.
    pub fn build(&self, result: &DqResult) -> Advisory {
        let issue_count = result.issues.len();
        Advisory {
            root_cause_analysis: format!(
                "Detected {issue_count} issues. Primary concerns involve null values and potential duplicates."
            ),
            pipeline_health: if issue_count > AT_RISK_ISSUE_COUNT {
                AT_RISK.to_string()
            } else {
                HEALTHY.to_string()
            },
            recommended_sql_fixes: "DELETE FROM table WHERE id IS NULL;".to_string(),
            recommended_python_fixes: "df = df.dropna(subset=['critical_col'])".to_string(),
            delta_optimizations: vec![
                "Run OPTIMIZE on the table".to_string(),
                "Run VACUUM to remove old files".to_string(),
            ],
            summary: "Data quality is generally acceptable but requires attention to null handling."
                .to_string(),
        }
    }
}

#[async_trait]
impl Advisor for TemplateAdvisor {
    #[instrument(skip(self, result), fields(issues = result.issues.len()))]
    async fn advise(&self, result: &DqResult) -> Result<Advisory> {
        let advisory = self.build(result);
        debug!(health = %advisory.pipeline_health, "Built template advisory");
        Ok(advisory)
    }
}
