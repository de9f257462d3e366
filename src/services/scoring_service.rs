use std::{sync::Arc, time::SystemTime};

use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    config::RankWeights,
    dao::{models::GuestSubmissionEntity, question_store::QuestionStore, storage::StorageError},
    dto::guest::{GuestSubmissionRequest, SubmissionResponse},
    error::ServiceError,
    state::SharedState,
};

/// Failure while folding a submission into the counters.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Nothing was written.
    #[error("store failure before anything was recorded")]
    Store(#[source] StorageError),
    /// Earlier writes landed and are kept; the rest of the submission was not applied.
    #[error("store failure after {applied} writes landed")]
    Partial {
        /// Writes that landed, the submission record included.
        applied: usize,
        /// Failure that stopped the submission.
        #[source]
        source: StorageError,
    },
}

/// What a submission changed, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScoringReport {
    /// Questions whose `totalAnswered` was incremented.
    pub questions: usize,
    /// Ranked answers that matched an answer text.
    pub matched: usize,
    /// Ranked answers (or whole questions) that matched nothing.
    pub skipped: usize,
}

/// Folds guest submissions into per-answer counters with rank weights.
pub struct ScoringEngine {
    store: Arc<dyn QuestionStore>,
    weights: RankWeights,
}

impl ScoringEngine {
    /// Engine writing to `store` with `weights`.
    pub fn new(store: Arc<dyn QuestionStore>, weights: RankWeights) -> Self {
        Self { store, weights }
    }

    /// Persist the submission, then for each referenced question add one to
    /// `totalAnswered` and add the rank weight to every answer whose text
    /// matches exactly.
    ///
    /// Each write is an independent atomic increment. The first failing write
    /// stops the submission without undoing earlier ones.
    pub async fn submit(&self, submission: GuestSubmissionEntity) -> Result<ScoringReport, ScoringError> {
        let mut applied = 0usize;
        let mut report = ScoringReport::default();
        let fail = |applied: usize, source: StorageError| {
            if applied == 0 {
                ScoringError::Store(source)
            } else {
                ScoringError::Partial { applied, source }
            }
        };

        let answers = submission.answers.clone();
        self.store
            .insert_submission(submission)
            .await
            .map_err(|err| fail(applied, err))?;
        applied += 1;

        for (question_id, ranked) in answers {
            let found = self
                .store
                .increment_total_answered(question_id.clone())
                .await
                .map_err(|err| fail(applied, err))?;
            if !found {
                report.skipped += ranked.len().max(1);
                continue;
            }
            applied += 1;
            report.questions += 1;

            for (rank, answer_text) in ranked.into_iter().enumerate() {
                let matched = self
                    .store
                    .increment_answer_count(question_id.clone(), answer_text, self.weights.weight(rank))
                    .await
                    .map_err(|err| fail(applied, err))?;
                if matched {
                    applied += 1;
                    report.matched += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Validate and score a guest submission.
pub async fn submit_guest_answers(
    state: &SharedState,
    request: GuestSubmissionRequest,
) -> Result<SubmissionResponse, ServiceError> {
    request.validate()?;

    let submitted_at = SystemTime::now();
    let submission = request.into_entity(submitted_at);
    let name = submission.name.clone();
    let engine = ScoringEngine::new(state.store(), state.config().game.rank_weights.clone());

    match engine.submit(submission).await {
        Ok(report) => {
            info!(
                guest = %name,
                questions = report.questions,
                matched = report.matched,
                skipped = report.skipped,
                "guest submission recorded"
            );
            Ok(SubmissionResponse::accepted(submitted_at))
        }
        Err(err) => {
            warn!(guest = %name, error = %err, "guest submission failed");
            Err(err.into())
        }
    }
}
