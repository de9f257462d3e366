use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias for MongoDB catalog operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the MongoDB catalog backend, one variant per operation.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Connection string rejected by the driver.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    /// Client could not be built from parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    /// Server never answered a ping during connect.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    /// Periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    /// Index creation failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    /// Ordered catalog read failed.
    #[error("failed to list questions")]
    ListQuestions {
        #[source]
        source: MongoError,
    },
    /// `$sample` aggregation failed.
    #[error("failed to sample a question")]
    SampleQuestion {
        #[source]
        source: MongoError,
    },
    /// Question insert failed.
    #[error("failed to insert question")]
    InsertQuestion {
        #[source]
        source: MongoError,
    },
    /// Guest submission insert failed.
    #[error("failed to store guest submission")]
    InsertSubmission {
        #[source]
        source: MongoError,
    },
    /// `$inc` on a question failed.
    #[error("failed to increment counter on question `{id}`")]
    Increment {
        id: String,
        #[source]
        source: MongoError,
    },
}
