//! Store wrapper that starts failing after a fixed number of calls.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use futures::future::BoxFuture;

use crate::dao::{
    models::{GuestSubmissionEntity, NewQuestionEntity, QuestionEntity},
    question_store::{QuestionStore, memory::MemoryQuestionStore},
    storage::{StorageError, StorageResult},
};

/// Memory store that starts failing from a given call number.
#[derive(Clone)]
pub struct FlakyStore {
    inner: MemoryQuestionStore,
    calls: Arc<AtomicUsize>,
    fail_from: usize,
}

impl FlakyStore {
    /// Calls numbered `fail_from` and later (0-based) fail.
    pub fn new(inner: MemoryQuestionStore, fail_from: usize) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
            fail_from,
        }
    }

    fn gate<T>(&self, call: BoxFuture<'static, StorageResult<T>>) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
    {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n >= self.fail_from {
            Box::pin(async move { Err(StorageError::Operation(format!("injected failure on call {n}"))) })
        } else {
            call
        }
    }
}

impl QuestionStore for FlakyStore {
    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        self.gate(self.inner.list_questions())
    }

    fn sample_question(&self) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        self.gate(self.inner.sample_question())
    }

    fn insert_question(&self, question: NewQuestionEntity) -> BoxFuture<'static, StorageResult<String>> {
        self.gate(self.inner.insert_question(question))
    }

    fn insert_submission(&self, submission: GuestSubmissionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.gate(self.inner.insert_submission(submission))
    }

    fn increment_total_answered(&self, question_id: String) -> BoxFuture<'static, StorageResult<bool>> {
        self.gate(self.inner.increment_total_answered(question_id))
    }

    fn increment_answer_count(
        &self,
        question_id: String,
        answer_text: String,
        weight: u32,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.gate(self.inner.increment_answer_count(question_id, answer_text, weight))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.gate(self.inner.health_check())
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.gate(self.inner.try_reconnect())
    }
}
