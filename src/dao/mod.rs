/// Database model definitions shared by every catalog backend.
pub mod models;
/// Question catalog abstraction and its backends.
pub mod question_store;
/// Storage abstraction layer for database operations.
pub mod storage;
