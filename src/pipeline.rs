//! One question-answer cycle over an open session.
//!
//! The cycle is modeled as explicit terminal states rather than inline error
//! handling: a failed execution transitions to a corrective re-prompt whose
//! outcome (suggested or failed) is part of the report, never an error.

use crate::executor::{self, ResultTable};
use crate::introspect::{DatabaseOverview, TableSchema};
use crate::llm::{response, CompletionModel};
use crate::prompt::{self, PromptContext};
use crate::session::Session;
use crate::types::Result;
use serde::Serialize;

/// Default trigger terms for the optional region-handling explanation.
/// Policy, not logic: override via [`Pipeline::with_region_keywords`].
pub const DEFAULT_REGION_KEYWORDS: &[&str] = &["region", "country", "us", "uk", "india"];

/// Outcome of the corrective re-prompt after a failed execution.
#[derive(Debug, Clone, Serialize)]
pub enum CorrectionOutcome {
    /// The model proposed a corrected query. Display only, never auto-executed.
    Suggested(String),
    /// The correction call itself failed.
    Failed(String),
}

/// Terminal state of one question-answer cycle.
#[derive(Debug, Clone, Serialize)]
pub enum QueryOutcome {
    /// Generated text is not a read query; nothing was executed.
    Rejected,
    /// The query ran and matched zero rows.
    Empty,
    /// The query ran and returned rows.
    Results(ResultTable),
    /// The engine rejected the query; one corrective suggestion was attempted.
    Failed {
        error: String,
        correction: CorrectionOutcome,
    },
}

/// Everything produced for one question.
#[derive(Debug, Clone, Serialize)]
pub struct AskReport {
    pub question: String,
    /// The stripped query text as returned by the model.
    pub query: String,
    pub outcome: QueryOutcome,
    /// Region-handling note. Present only when the question matched a region
    /// keyword and the query returned rows.
    pub explanation: Option<String>,
}

/// Question-answer pipeline over a completion model.
pub struct Pipeline<M: CompletionModel> {
    model: M,
    region_keywords: Vec<String>,
}

impl<M: CompletionModel> Pipeline<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            region_keywords: DEFAULT_REGION_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Override the region-explanation trigger terms.
    pub fn with_region_keywords(mut self, keywords: Vec<String>) -> Self {
        self.region_keywords = keywords;
        self
    }

    /// The underlying completion model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run one full cycle: introspect, prompt, generate, gate, execute.
    ///
    /// Each call is an isolated unit of work; nothing is retained between
    /// questions beyond the session's open connection.
    ///
    /// # Errors
    ///
    /// `AskError::EmptySource` if the database has no tables,
    /// `AskError::Generation` if the model call fails. Rejection and
    /// execution failure are not errors: they surface as terminal states in
    /// the report.
    pub async fn ask(&self, session: &Session, question: &str) -> Result<AskReport> {
        let overview = session.overview()?;
        self.ask_with_overview(session, &overview, question).await
    }

    /// Same as [`Pipeline::ask`], reusing an overview introspected earlier in
    /// the session.
    pub async fn ask_with_overview(
        &self,
        session: &Session,
        overview: &DatabaseOverview,
        question: &str,
    ) -> Result<AskReport> {
        let ctx = PromptContext::from_overview(overview, question);
        let request = prompt::compose(&ctx);
        tracing::debug!(chars = request.len(), "generation prompt built");

        let reply = self.model.complete(&request).await?;
        let query = response::strip_code_fences(&reply);
        tracing::info!(%query, "model returned query");

        if !executor::is_read_query(&query) {
            return Ok(AskReport {
                question: question.to_string(),
                query,
                outcome: QueryOutcome::Rejected,
                explanation: None,
            });
        }

        let (outcome, explanation) = match executor::run_query(session.connection(), &query) {
            Ok(table) if table.is_empty() => (QueryOutcome::Empty, None),
            Ok(table) => {
                let explanation = if self.mentions_region(question) {
                    self.request_explanation(question, &query).await
                } else {
                    None
                };
                (QueryOutcome::Results(table), explanation)
            }
            Err(e) => {
                let error = e.to_string();
                tracing::warn!(%error, "query execution failed");
                let correction = self
                    .request_correction(&query, &error, &overview.tables)
                    .await;
                (QueryOutcome::Failed { error, correction }, None)
            }
        };

        Ok(AskReport {
            question: question.to_string(),
            query,
            outcome,
            explanation,
        })
    }

    fn mentions_region(&self, question: &str) -> bool {
        let lowered = question.to_lowercase();
        self.region_keywords
            .iter()
            .any(|k| lowered.contains(&k.to_lowercase()))
    }

    /// Exactly one corrective attempt per failed execution. The suggestion is
    /// display-only and never executed.
    async fn request_correction(
        &self,
        query: &str,
        error: &str,
        tables: &[TableSchema],
    ) -> CorrectionOutcome {
        let request = prompt::correction_prompt(query, error, tables);
        match self.model.complete(&request).await {
            Ok(reply) => CorrectionOutcome::Suggested(response::strip_code_fences(&reply)),
            Err(e) => {
                tracing::warn!(error = %e, "correction call failed");
                CorrectionOutcome::Failed(e.to_string())
            }
        }
    }

    /// Best-effort: a failure here never affects the primary result.
    async fn request_explanation(&self, question: &str, query: &str) -> Option<String> {
        let request = prompt::explanation_prompt(question, query);
        match self.model.complete(&request).await {
            Ok(reply) => Some(reply.trim().to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "explanation call failed");
                None
            }
        }
    }
}
