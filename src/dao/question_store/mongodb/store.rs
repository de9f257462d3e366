use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{doc, oid::ObjectId},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    config::MongoConfig,
    connection::{self, ConnectPolicy},
    error::{MongoDaoError, MongoResult},
    models::{MongoQuestionDocument, MongoSubmissionDocument},
};
use crate::dao::{
    models::{GuestSubmissionEntity, NewQuestionEntity, QuestionEntity},
    question_store::QuestionStore,
    storage::StorageResult,
};

const QUESTION_COLLECTION_NAME: &str = "questions";
const SUBMISSION_COLLECTION_NAME: &str = "guest_answers";

/// MongoDB-backed [`QuestionStore`].
#[derive(Clone)]
pub struct MongoQuestionStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Kept alive alongside the database handle it produced.
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        connection::ping(&database)
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = connection::connect(&self.config, ConnectPolicy::SINGLE).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoQuestionStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = connection::connect(&config, ConnectPolicy::STARTUP).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"order": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("question_order_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUESTION_COLLECTION_NAME,
                index: "order",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoQuestionDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoQuestionDocument>(QUESTION_COLLECTION_NAME)
    }

    async fn submission_collection(&self) -> Collection<MongoSubmissionDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoSubmissionDocument>(SUBMISSION_COLLECTION_NAME)
    }

    async fn list_questions(&self) -> MongoResult<Vec<QuestionEntity>> {
        let collection = self.collection().await;

        let documents: Vec<MongoQuestionDocument> = collection
            .find(doc! {})
            .sort(doc! {"order": 1})
            .await
            .map_err(|source| MongoDaoError::ListQuestions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListQuestions { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn sample_question(&self) -> MongoResult<Option<QuestionEntity>> {
        let collection = self.collection().await;

        let mut cursor = collection
            .aggregate([doc! {"$sample": {"size": 1}}])
            .with_type::<MongoQuestionDocument>()
            .await
            .map_err(|source| MongoDaoError::SampleQuestion { source })?;

        let document = cursor
            .try_next()
            .await
            .map_err(|source| MongoDaoError::SampleQuestion { source })?;

        Ok(document.map(Into::into))
    }

    async fn insert_question(&self, question: NewQuestionEntity) -> MongoResult<String> {
        let collection = self.collection().await;

        let last = collection
            .find_one(doc! {})
            .sort(doc! {"order": -1})
            .await
            .map_err(|source| MongoDaoError::InsertQuestion { source })?;
        let order = last.map_or(0, |document| document.order + 1);

        let document = MongoQuestionDocument::new(question, order);
        let id = document.id.to_hex();
        collection
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::InsertQuestion { source })?;

        Ok(id)
    }

    async fn insert_submission(&self, submission: GuestSubmissionEntity) -> MongoResult<()> {
        let collection = self.submission_collection().await;
        let document: MongoSubmissionDocument = submission.into();

        collection
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::InsertSubmission { source })?;

        Ok(())
    }

    async fn increment_total_answered(&self, id: String) -> MongoResult<bool> {
        let Ok(object_id) = ObjectId::parse_str(&id) else {
            debug!(question_id = %id, "question id is not an ObjectId; nothing to increment");
            return Ok(false);
        };
        let collection = self.collection().await;

        let result = collection
            .update_one(
                doc! {"_id": object_id},
                doc! {"$inc": {"totalAnswered": 1}},
            )
            .await
            .map_err(|source| MongoDaoError::Increment { id, source })?;

        Ok(result.matched_count > 0)
    }

    async fn increment_answer_count(
        &self,
        id: String,
        answer_text: String,
        weight: u32,
    ) -> MongoResult<bool> {
        let Ok(object_id) = ObjectId::parse_str(&id) else {
            debug!(question_id = %id, "question id is not an ObjectId; nothing to increment");
            return Ok(false);
        };
        let collection = self.collection().await;

        // The positional operator targets the first answer whose text matched
        // the filter, inside the same single-document atomic update.
        let result = collection
            .update_one(
                doc! {"_id": object_id, "answers.text": answer_text},
                doc! {"$inc": {"answers.$.count": i64::from(weight)}},
            )
            .await
            .map_err(|source| MongoDaoError::Increment { id, source })?;

        Ok(result.matched_count > 0)
    }
}

impl QuestionStore for MongoQuestionStore {
    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_questions().await.map_err(Into::into) })
    }

    fn sample_question(&self) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.sample_question().await.map_err(Into::into) })
    }

    fn insert_question(&self, question: NewQuestionEntity) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move { store.insert_question(question).await.map_err(Into::into) })
    }

    fn insert_submission(&self, submission: GuestSubmissionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_submission(submission).await.map_err(Into::into) })
    }

    fn increment_total_answered(&self, question_id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .increment_total_answered(question_id)
                .await
                .map_err(Into::into)
        })
    }

    fn increment_answer_count(
        &self,
        question_id: String,
        answer_text: String,
        weight: u32,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .increment_answer_count(question_id, answer_text, weight)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
