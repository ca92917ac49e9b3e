/// Database model definitions.
pub mod models;
/// Pick'em persistence trait and its backends.
pub mod pickem_store;
/// Storage abstraction layer for database operations.
pub mod storage;
