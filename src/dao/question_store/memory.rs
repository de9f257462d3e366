//! In-process catalog backend used by tests and by local runs without MongoDB.

use std::sync::Arc;

use futures::future::BoxFuture;
use rand::{rng, seq::IndexedRandom};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::dao::{
    models::{AnswerEntity, GuestSubmissionEntity, NewQuestionEntity, QuestionEntity},
    question_store::QuestionStore,
    storage::StorageResult,
};

/// [`QuestionStore`] keeping every document in memory.
///
/// Each increment runs under the catalog mutex, which gives the same
/// per-operation atomicity as a database `$inc`.
#[derive(Clone, Default)]
pub struct MemoryQuestionStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    questions: Mutex<Vec<QuestionEntity>>,
    submissions: Mutex<Vec<GuestSubmissionEntity>>,
}

impl MemoryQuestionStore {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-filled with `questions` (kept in the given order).
    pub fn with_questions(questions: Vec<QuestionEntity>) -> Self {
        let store = Self::default();
        // The mutex is brand new, nobody else can hold it.
        if let Ok(mut guard) = store.inner.questions.try_lock() {
            *guard = questions;
        }
        store
    }

    /// Snapshot of a single question, mostly useful to assert on counters.
    pub async fn question(&self, id: &str) -> Option<QuestionEntity> {
        let guard = self.inner.questions.lock().await;
        guard.iter().find(|question| question.id == id).cloned()
    }

    /// Every submission written so far, in arrival order.
    pub async fn submissions(&self) -> Vec<GuestSubmissionEntity> {
        self.inner.submissions.lock().await.clone()
    }

    /// Replace the `order` of a question, simulating a catalog edit.
    pub async fn set_order(&self, id: &str, order: i64) -> bool {
        let mut guard = self.inner.questions.lock().await;
        match guard.iter_mut().find(|question| question.id == id) {
            Some(question) => {
                question.order = order;
                true
            }
            None => false,
        }
    }

    /// Remove a question from the catalog.
    pub async fn remove_question(&self, id: &str) -> bool {
        let mut guard = self.inner.questions.lock().await;
        let before = guard.len();
        guard.retain(|question| question.id != id);
        guard.len() != before
    }

    async fn sorted_questions(&self) -> Vec<QuestionEntity> {
        let mut questions = self.inner.questions.lock().await.clone();
        questions.sort_by_key(|question| question.order);
        questions
    }

    async fn insert_question_entity(&self, question: NewQuestionEntity) -> String {
        let mut guard = self.inner.questions.lock().await;
        let order = guard
            .iter()
            .map(|existing| existing.order)
            .max()
            .map_or(0, |max| max + 1);
        let id = Uuid::new_v4().simple().to_string();
        guard.push(QuestionEntity {
            id: id.clone(),
            text: question.text,
            order,
            answers: question
                .answers
                .into_iter()
                .map(|text| AnswerEntity { text, count: 0 })
                .collect(),
            total_answered: 0,
        });
        id
    }

    async fn bump_total(&self, question_id: &str) -> bool {
        let mut guard = self.inner.questions.lock().await;
        match guard.iter_mut().find(|question| question.id == question_id) {
            Some(question) => {
                question.total_answered += 1;
                true
            }
            None => false,
        }
    }

    async fn bump_answer(&self, question_id: &str, answer_text: &str, weight: u32) -> bool {
        let mut guard = self.inner.questions.lock().await;
        let answer = guard
            .iter_mut()
            .find(|question| question.id == question_id)
            .and_then(|question| {
                question
                    .answers
                    .iter_mut()
                    .find(|answer| answer.text == answer_text)
            });
        match answer {
            Some(answer) => {
                answer.count += i64::from(weight);
                true
            }
            None => false,
        }
    }
}

impl QuestionStore for MemoryQuestionStore {
    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.sorted_questions().await) })
    }

    fn sample_question(&self) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let guard = store.inner.questions.lock().await;
            Ok(guard.choose(&mut rng()).cloned())
        })
    }

    fn insert_question(&self, question: NewQuestionEntity) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.insert_question_entity(question).await) })
    }

    fn insert_submission(&self, submission: GuestSubmissionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.submissions.lock().await.push(submission);
            Ok(())
        })
    }

    fn increment_total_answered(&self, question_id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.bump_total(&question_id).await) })
    }

    fn increment_answer_count(
        &self,
        question_id: String,
        answer_text: String,
        weight: u32,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.bump_answer(&question_id, &answer_text, weight).await) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_question(text: &str, answers: &[&str]) -> NewQuestionEntity {
        NewQuestionEntity {
            text: text.into(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn inserted_questions_append_to_order() {
        let store = MemoryQuestionStore::new();
        let first = store.insert_question(new_question("Q1", &["a"])).await.unwrap();
        let second = store.insert_question(new_question("Q2", &["b"])).await.unwrap();

        let listed = store.list_questions().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first);
        assert_eq!(listed[0].order, 0);
        assert_eq!(listed[1].id, second);
        assert_eq!(listed[1].order, 1);
        assert!(listed.iter().all(|q| q.total_answered == 0));
    }

    #[tokio::test]
    async fn list_is_sorted_by_order_field() {
        let store = MemoryQuestionStore::new();
        let first = store.insert_question(new_question("Q1", &[])).await.unwrap();
        store.insert_question(new_question("Q2", &[])).await.unwrap();
        assert!(store.set_order(&first, 10).await);

        let listed = store.list_questions().await.unwrap();
        assert_eq!(listed[0].text, "Q2");
        assert_eq!(listed[1].text, "Q1");
    }

    #[tokio::test]
    async fn increments_only_touch_exact_matches() {
        let store = MemoryQuestionStore::new();
        let id = store
            .insert_question(new_question("Q1", &["Paris", "Lyon"]))
            .await
            .unwrap();

        assert!(store.increment_answer_count(id.clone(), "Paris".into(), 5).await.unwrap());
        assert!(!store.increment_answer_count(id.clone(), "paris".into(), 5).await.unwrap());
        assert!(!store.increment_answer_count("missing".into(), "Paris".into(), 5).await.unwrap());

        let question = store.question(&id).await.unwrap();
        assert_eq!(question.answer("Paris").unwrap().count, 5);
        assert_eq!(question.answer("Lyon").unwrap().count, 0);
    }

    #[tokio::test]
    async fn sample_of_empty_catalog_is_none() {
        let store = MemoryQuestionStore::new();
        assert!(store.sample_question().await.unwrap().is_none());
    }
}
