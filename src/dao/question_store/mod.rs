#[cfg(test)]
pub(crate) mod flaky;
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::{GuestSubmissionEntity, NewQuestionEntity, QuestionEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the durable question catalog.
///
/// Counter mutations are single atomic increments performed by the backend;
/// callers never read a counter to write it back.
pub trait QuestionStore: Send + Sync {
    /// Every question, sorted by `order` ascending.
    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    /// One question drawn uniformly at random, `None` when the catalog is empty.
    fn sample_question(&self) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    /// Append a question after the current last one and return its id.
    fn insert_question(&self, question: NewQuestionEntity) -> BoxFuture<'static, StorageResult<String>>;
    /// Persist a guest submission as-is.
    fn insert_submission(&self, submission: GuestSubmissionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Atomically add one to `totalAnswered`. Returns whether a question matched.
    fn increment_total_answered(&self, question_id: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Atomically add `weight` to the count of the answer whose text equals
    /// `answer_text`. Returns whether an answer matched.
    fn increment_answer_count(
        &self,
        question_id: String,
        answer_text: String,
        weight: u32,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
