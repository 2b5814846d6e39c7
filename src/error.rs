//! Error types for session storage operations.

use sea_orm::DbErr;

/// Convenience alias used throughout the crate.
pub type Result<T, E = StorageError> = std::result::Result<T, E>;

/// Errors that can occur while storing or loading sessions.
///
/// "Not found" is never an error: [`load_session`](crate::SessionStorage::load_session)
/// returns `Ok(None)` and [`find_sessions_by_shop`](crate::SessionStorage::find_sessions_by_shop)
/// returns an empty vector.
///
/// None of the variants carry plaintext access tokens or key material.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Missing or malformed configuration, e.g. an encryption key that is not
    /// 32 bytes of hex or an unparseable database URL.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A value handed to an encryptor was empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The cipher refused to encrypt.
    #[error("encryption failed")]
    Encryption,

    /// The stored value could not be decrypted: bad encoding, truncated
    /// input, or a failed authentication tag check.
    #[error("decryption failed: {0}")]
    Decryption(&'static str),

    /// The backend could not be reached or the pool could not hand out a
    /// connection.
    #[error("connection error: {0}")]
    Connection(#[source] DbErr),

    /// The statement referenced a column that the physical table lacks.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(#[source] DbErr),

    /// Any other failure reported by the database.
    #[error("query failed: {0}")]
    Query(#[source] DbErr),

    /// A row returned by the database could not be mapped into a session.
    #[error("could not decode session row: {0}")]
    Decode(String),
}

impl From<DbErr> for StorageError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => StorageError::Connection(err),
            _ if is_missing_column(&err.to_string()) => StorageError::SchemaMismatch(err),
            _ => StorageError::Query(err),
        }
    }
}

// Driver messages for a column absent from the target table:
//   postgres: column "x" of relation "t" does not exist (42703)
//   sqlite:   table t has no column named x / no such column: x
//   mysql:    Unknown column 'x' in 'field list'
fn is_missing_column(message: &str) -> bool {
    (message.contains("column") && message.contains("does not exist"))
        || message.contains("42703")
        || message.contains("has no column named")
        || message.contains("no such column")
        || message.contains("Unknown column")
}
