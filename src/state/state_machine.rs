use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// Phases of the question progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing shown yet, or the session was reset.
    Idle,
    /// A question is on screen.
    QuestionActive,
    /// A start/advance is planned and the catalog is being fetched.
    AwaitingNext,
    /// The index went past the end of the catalog.
    Ended,
}

/// Commands that can be applied to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Show the question at the current index.
    Start,
    /// Move to the next question.
    Advance,
    /// Rewind to idle at index 0 and open a new epoch.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the session was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Errors that can occur when planning a session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Session version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: u64,
        /// Current version.
        actual: u64,
    },
}

/// Errors that can occur when aborting a planned session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A validated transition whose target still depends on the catalog length.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the session was in before planning.
    pub from: SessionPhase,
    /// Event that triggered this transition.
    pub event: SessionEvent,
    /// Version the session must still have when the plan is applied.
    pub version: u64,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Result of an applied transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Phase before the transition.
    pub from: SessionPhase,
    /// Phase after the transition.
    pub to: SessionPhase,
    /// Index after the transition.
    pub index: usize,
    /// False when the transition left index and phase untouched.
    pub changed: bool,
    /// True when a different question is now on screen.
    pub new_question: bool,
}

/// Snapshot of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: SessionPhase,
    /// 0-based position in the ordered catalog.
    pub current_question_index: usize,
    /// Incremented by every reset.
    pub epoch: u64,
    /// Incremented by every applied transition.
    pub version: u64,
    /// Catalog length observed when the session started.
    pub catalog_len_at_start: Option<usize>,
}

/// Authoritative game position.
///
/// Start and advance are two-step: [`plan`](Self::plan) moves the session to
/// [`SessionPhase::AwaitingNext`] while the caller fetches the ordered catalog,
/// then [`apply`](Self::apply) resolves the target against the fetched length
/// or [`abort`](Self::abort) restores the previous phase.
#[derive(Debug, Clone)]
pub struct SessionState {
    phase: SessionPhase,
    current_question_index: usize,
    epoch: u64,
    version: u64,
    catalog_len_at_start: Option<usize>,
    pending: Option<Plan>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            current_question_index: 0,
            epoch: 0,
            version: 0,
            catalog_len_at_start: None,
            pending: None,
        }
    }
}

impl SessionState {
    /// Create a new session initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// 0-based position in the ordered catalog.
    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    /// Create a snapshot of the current session.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            current_question_index: self.current_question_index,
            epoch: self.epoch,
            version: self.version,
            catalog_len_at_start: self.catalog_len_at_start,
        }
    }

    /// Validate `event` against the current phase and park the session in
    /// [`SessionPhase::AwaitingNext`] until the plan is applied or aborted.
    pub fn plan(&mut self, event: SessionEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        match (self.phase, event) {
            (SessionPhase::Ended, SessionEvent::Start) => {
                return Err(PlanError::InvalidTransition(InvalidTransition {
                    from: self.phase,
                    event,
                }));
            }
            (SessionPhase::QuestionActive, SessionEvent::Start) => {
                return Err(PlanError::InvalidTransition(InvalidTransition {
                    from: self.phase,
                    event,
                }));
            }
            _ => {}
        }

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            event,
            version: self.version,
            pending_since: Instant::now(),
        };

        if event != SessionEvent::Reset {
            self.phase = SessionPhase::AwaitingNext;
        }
        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition against the freshly fetched catalog length.
    pub fn apply(&mut self, plan_id: PlanId, catalog_len: usize) -> Result<Transition, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        if plan.version != self.version {
            self.phase = plan.from;
            return Err(ApplyError::VersionMismatch {
                expected: plan.version,
                actual: self.version,
            });
        }

        let transition = self.compute_transition(&plan, catalog_len);
        self.phase = transition.to;
        self.current_question_index = transition.index;
        if transition.changed {
            self.version += 1;
        }

        Ok(transition)
    }

    /// Abort a planned transition, returning the session to its previous phase.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.phase = plan.from;
        self.pending = None;
        Ok(())
    }

    fn compute_transition(&mut self, plan: &Plan, catalog_len: usize) -> Transition {
        let index = self.current_question_index;
        let unchanged = Transition {
            from: plan.from,
            to: plan.from,
            index,
            changed: false,
            new_question: false,
        };

        match (plan.from, plan.event) {
            (_, SessionEvent::Reset) => {
                self.epoch += 1;
                self.catalog_len_at_start = None;
                Transition {
                    from: plan.from,
                    to: SessionPhase::Idle,
                    index: 0,
                    changed: true,
                    new_question: false,
                }
            }
            (SessionPhase::Idle, SessionEvent::Start | SessionEvent::Advance) => {
                self.catalog_len_at_start = Some(catalog_len);
                let to = if index < catalog_len {
                    SessionPhase::QuestionActive
                } else {
                    SessionPhase::Ended
                };
                Transition {
                    from: plan.from,
                    to,
                    index,
                    changed: true,
                    new_question: to == SessionPhase::QuestionActive,
                }
            }
            (SessionPhase::QuestionActive, SessionEvent::Advance) => {
                let next = index + 1;
                let to = if next < catalog_len {
                    SessionPhase::QuestionActive
                } else {
                    SessionPhase::Ended
                };
                Transition {
                    from: plan.from,
                    to,
                    index: next,
                    changed: true,
                    new_question: to == SessionPhase::QuestionActive,
                }
            }
            // Ended stays ended; nothing else reaches here past `plan`.
            _ => unchanged,
        }
    }
}
