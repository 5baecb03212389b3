//! Command lifecycle — prompt in, plan out, mutations applied, outcome
//! recorded.
//!
//! DESIGN
//! ======
//! One orchestrator drives one document. The lifecycle is
//! `Idle → AwaitingPlan → {AwaitingClarification → AwaitingPlan} →
//! Executing → {Completed | Failed} → Idle`. Empty prompts fail before
//! any network call. A clarification suspends the flow (no timeout) until
//! it is resolved or cancelled; nothing executes from a clarification
//! plan. Execution routes server-side for oversized or grid-bearing
//! plans, client-side through the interpreter otherwise. Exactly one
//! history entry is appended per terminal command; partial mutations are
//! never rolled back.

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod orchestrator_test;

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::api::DocumentApi;
use crate::error::ErrorCode;
use crate::history::{
    CommandHistory, CommandHistoryEntry, ErrorRecord, ExecutionMode, ExecutionSummary, now_ms,
};
use crate::interpreter::{ExecutionError, OperationError, OperationInterpreter, ProgressSink};
use crate::plan::{Plan, ValidationError};
use crate::planner::{PlanService, ServiceError};
use crate::resolver::ResolutionError;

// =============================================================================
// TYPES
// =============================================================================

/// Observable position in the command lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Idle,
    AwaitingPlan,
    AwaitingClarification,
    Executing,
    Completed,
    Failed,
}

/// A clarification waiting on a human decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingClarification {
    pub question: String,
    pub options: Vec<String>,
    pub original_prompt: String,
}

/// Terminal result of a submitted command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The plan was applied; the history entry id and summary are attached.
    Applied {
        entry_id: Uuid,
        summary: ExecutionSummary,
        rationale: Option<String>,
    },
    /// The service wants a disambiguation first; nothing was executed.
    NeedsClarification { question: String, options: Vec<String> },
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("planning failed: {0}")]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("no clarification is pending")]
    NoPendingClarification,
}

impl ErrorCode for CommandError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Service(e) => e.error_code(),
            Self::Execution(e) => e.error_code(),
            Self::NoPendingClarification => "E_NO_PENDING_CLARIFICATION",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Validation(e) => e.retryable(),
            Self::Service(e) => e.retryable(),
            Self::Execution(e) => e.retryable(),
            Self::NoPendingClarification => false,
        }
    }
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Owns the command lifecycle for one document.
pub struct PlanOrchestrator {
    planner: Arc<dyn PlanService>,
    api: Arc<dyn DocumentApi>,
    history: CommandHistory,
    state: CommandState,
    pending: Option<PendingClarification>,
}

impl PlanOrchestrator {
    #[must_use]
    pub fn new(planner: Arc<dyn PlanService>, api: Arc<dyn DocumentApi>) -> Self {
        Self {
            planner,
            api,
            history: CommandHistory::new(),
            state: CommandState::Idle,
            pending: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> CommandState {
        self.state
    }

    #[must_use]
    pub fn pending_clarification(&self) -> Option<&PendingClarification> {
        self.pending.as_ref()
    }

    /// Read access to the command log.
    #[must_use]
    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Mutable access for user-triggered deletion and clearing.
    pub fn history_mut(&mut self) -> &mut CommandHistory {
        &mut self.history
    }

    /// Run one natural-language command through plan, clarification, and
    /// execution. `progress` fires per completed operation during
    /// client-side execution.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty prompt (before any network call),
    /// `Service` for planning failures, `Execution` for fail-fast
    /// execution failures (earlier mutations stay applied).
    pub async fn submit(
        &mut self,
        prompt: &str,
        progress: &mut dyn ProgressSink,
    ) -> Result<CommandOutcome, CommandError> {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyPrompt.into());
        }

        // A fresh submission supersedes any suspended clarification.
        self.pending = None;
        self.state = CommandState::AwaitingPlan;
        info!(prompt_len = trimmed.len(), "command: submitted");
        let started = Instant::now();

        let snapshot = self.api.snapshot().await;
        let mut plan = match self.planner.request_plan(trimmed, &snapshot).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "command: planning failed");
                self.finish_failure(trimmed, Plan::default(), started, service_error_record(&e));
                return Err(e.into());
            }
        };

        if let Err(e) = plan.validate() {
            warn!(code = e.error_code(), error = %e, "command: malformed plan from service");
            self.finish_failure(trimmed, plan.clone(), started, plain_error_record(&e));
            return Err(e.into());
        }

        if let Some(clarification) = plan.clarification.take() {
            info!(question = %clarification.question, "command: clarification requested");
            self.pending = Some(PendingClarification {
                question: clarification.question.clone(),
                options: clarification.options.clone(),
                original_prompt: trimmed.to_string(),
            });
            self.state = CommandState::AwaitingClarification;
            return Ok(CommandOutcome::NeedsClarification {
                question: clarification.question,
                options: clarification.options,
            });
        }

        if plan.prefers_server_execution() {
            self.execute_server_side(trimmed, plan, started).await
        } else {
            self.execute_client_side(trimmed, plan, started, progress).await
        }
    }

    /// Answer a pending clarification: re-enters the planning flow with
    /// the original prompt augmented by the selected option.
    ///
    /// # Errors
    ///
    /// `NoPendingClarification` when nothing is waiting; otherwise as
    /// [`Self::submit`].
    pub async fn resolve_clarification(
        &mut self,
        selected_option: &str,
        progress: &mut dyn ProgressSink,
    ) -> Result<CommandOutcome, CommandError> {
        let pending = self.pending.take().ok_or(CommandError::NoPendingClarification)?;
        let augmented = format!("{} ({selected_option})", pending.original_prompt);
        info!(option = selected_option, "command: clarification resolved");
        self.submit(&augmented, progress).await
    }

    /// Abandon a pending clarification. Returns whether one was pending.
    pub fn cancel_clarification(&mut self) -> bool {
        let had_pending = self.pending.take().is_some();
        if had_pending {
            info!("command: clarification cancelled");
        }
        self.state = CommandState::Idle;
        had_pending
    }

    // -------------------------------------------------------------------------
    // execution paths
    // -------------------------------------------------------------------------

    async fn execute_server_side(
        &mut self,
        prompt: &str,
        plan: Plan,
        started: Instant,
    ) -> Result<CommandOutcome, CommandError> {
        info!(operations = plan.operations.len(), "command: executing server-side");
        self.state = CommandState::Executing;
        let snapshot = self.api.snapshot().await;
        match self.planner.execute_remote(prompt, &snapshot).await {
            Ok(remote) => {
                let summary = ExecutionSummary {
                    operations_executed: remote.operations_applied.try_into().unwrap_or(usize::MAX),
                    operations_failed: 0,
                    created: remote.shape_ids,
                    modified: Vec::new(),
                    deleted: Vec::new(),
                    duration_ms: elapsed_ms(started),
                    mode: ExecutionMode::Server,
                };
                let rationale = plan.rationale.clone();
                let entry_id = self.finish_success(prompt, plan, summary.clone());
                Ok(CommandOutcome::Applied { entry_id, summary, rationale })
            }
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "command: server-side execution failed");
                let record = service_error_record(&e);
                self.finish_failure_with_mode(prompt, plan, started, record, ExecutionMode::Server);
                Err(e.into())
            }
        }
    }

    async fn execute_client_side(
        &mut self,
        prompt: &str,
        plan: Plan,
        started: Instant,
        progress: &mut dyn ProgressSink,
    ) -> Result<CommandOutcome, CommandError> {
        info!(operations = plan.operations.len(), "command: executing client-side");
        self.state = CommandState::Executing;
        let interpreter = OperationInterpreter::new(self.api.as_ref());
        match interpreter.execute(&plan.operations, progress).await {
            Ok(report) => {
                let summary = ExecutionSummary {
                    operations_executed: report.executed,
                    operations_failed: 0,
                    created: report.created,
                    modified: report.modified,
                    deleted: report.deleted,
                    duration_ms: elapsed_ms(started),
                    mode: ExecutionMode::Client,
                };
                let rationale = plan.rationale.clone();
                let entry_id = self.finish_success(prompt, plan, summary.clone());
                Ok(CommandOutcome::Applied { entry_id, summary, rationale })
            }
            Err(e) => {
                warn!(
                    index = e.index,
                    op = e.operation,
                    code = e.error_code(),
                    error = %e,
                    "command: execution aborted"
                );
                let summary = ExecutionSummary {
                    operations_executed: e.report.executed,
                    operations_failed: 1,
                    created: e.report.created.clone(),
                    modified: e.report.modified.clone(),
                    deleted: e.report.deleted.clone(),
                    duration_ms: elapsed_ms(started),
                    mode: ExecutionMode::Client,
                };
                let record = execution_error_record(&e);
                self.state = CommandState::Failed;
                self.append_entry(prompt, plan, summary, Some(record));
                self.state = CommandState::Idle;
                Err(e.into())
            }
        }
    }

    // -------------------------------------------------------------------------
    // outcome recording
    // -------------------------------------------------------------------------

    fn finish_success(&mut self, prompt: &str, plan: Plan, summary: ExecutionSummary) -> Uuid {
        info!(
            executed = summary.operations_executed,
            created = summary.created.len(),
            duration_ms = summary.duration_ms,
            "command: completed"
        );
        self.state = CommandState::Completed;
        let entry_id = self.append_entry(prompt, plan, summary, None);
        self.state = CommandState::Idle;
        entry_id
    }

    fn finish_failure(&mut self, prompt: &str, plan: Plan, started: Instant, record: ErrorRecord) {
        self.finish_failure_with_mode(prompt, plan, started, record, ExecutionMode::Client);
    }

    fn finish_failure_with_mode(
        &mut self,
        prompt: &str,
        plan: Plan,
        started: Instant,
        record: ErrorRecord,
        mode: ExecutionMode,
    ) {
        self.state = CommandState::Failed;
        let summary = ExecutionSummary::empty(mode, elapsed_ms(started));
        self.append_entry(prompt, plan, summary, Some(record));
        self.state = CommandState::Idle;
    }

    fn append_entry(
        &mut self,
        prompt: &str,
        plan: Plan,
        summary: ExecutionSummary,
        error: Option<ErrorRecord>,
    ) -> Uuid {
        let entry = CommandHistoryEntry {
            id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            ts: now_ms(),
            success: error.is_none(),
            plan,
            summary,
            error,
        };
        let entry_id = entry.id;
        self.history.append(entry);
        entry_id
    }
}

// =============================================================================
// ERROR RECORDS
// =============================================================================

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn plain_error_record(error: &(impl ErrorCode + ?Sized)) -> ErrorRecord {
    ErrorRecord {
        message: error.to_string(),
        code: error.error_code().to_string(),
        failed_index: None,
        detail: None,
    }
}

fn service_error_record(error: &ServiceError) -> ErrorRecord {
    let mut record = plain_error_record(error);
    // Response bodies are diagnostics, not user-facing messages.
    if let ServiceError::Api { body, .. } = error {
        if !body.is_empty() {
            record.detail = Some(body.clone());
        }
    }
    record
}

fn execution_error_record(error: &ExecutionError) -> ErrorRecord {
    let mut record = plain_error_record(error);
    record.failed_index = Some(error.index);
    // Resolver candidate lists ride along for post-mortems.
    if let OperationError::Resolution(ResolutionError::NotResolvable { candidates, .. }) = &error.source {
        record.detail = serde_json::to_string(candidates).ok();
    }
    record
}
