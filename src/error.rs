//! Crate-wide error taxonomy.
//!
//! A single `thiserror`-derived enum realizes the "Kind" column of the
//! error taxonomy: recoverable conditions the caller turns into a protocol
//! error frame, plus the two core-fatal kinds (`Overflow`, `MalformedEntry`)
//! that a dispatch layer is permitted to treat as unrecoverable for the
//! affected connection.

/// Errors returned by the key/value store, the list store, and the codec
/// layers beneath them.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// NX on an existing key, XX on a missing key, or IFEQ mismatch.
    #[error("wrong condition for key `{key}`")]
    WrongCondition {
        /// The key the condition was evaluated against.
        key: String,
    },

    /// INCR/DECR/INCRBY/DECRBY on a payload that does not decode as an integer.
    #[error("value at key `{key}` is not an integer")]
    NotInteger {
        /// The key whose payload failed to parse.
        key: String,
    },

    /// 64-bit signed arithmetic would wrap during INCR/DECR.
    #[error("increment or decrement of key `{key}` would overflow a 64-bit integer")]
    IntegerOverflow {
        /// The key whose arithmetic overflowed.
        key: String,
    },

    /// A key holds a value of the wrong kind for the requested operation.
    #[error("key `{key}` holds the wrong type for this operation")]
    WrongType {
        /// The key whose stored type conflicted with the operation.
        key: String,
    },

    /// A listpack write would exceed its configured capacity and no new
    /// node could be formed to absorb it.
    #[error("listpack write exceeds capacity")]
    Overflow,

    /// Byte-level corruption was found while decoding a listpack entry.
    ///
    /// This indicates the engine's own invariants are broken; callers may
    /// treat it as unrecoverable for the owning quicklist.
    #[error("malformed listpack entry")]
    MalformedEntry,

    /// A cancellation context fired while an operation was waiting on a lock.
    #[error("operation cancelled")]
    Cancelled,
}

impl StorageError {
    /// Short, stable tag for this error's kind, independent of the
    /// human-readable `Display` message — useful for protocol-error mapping.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::WrongCondition { .. } => "WrongCondition",
            StorageError::NotInteger { .. } => "NotInteger",
            StorageError::IntegerOverflow { .. } => "IntegerOverflow",
            StorageError::WrongType { .. } => "WrongType",
            StorageError::Overflow => "Overflow",
            StorageError::MalformedEntry => "MalformedEntry",
            StorageError::Cancelled => "Cancelled",
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
