//! Classification of database failures.
//!
//! Every failure coming out of sqlx is sorted into one [`StoreErrorKind`].
//! Only [`StoreErrorKind::Transient`] failures are retried by the executor
//! and reported to clients as "service unavailable".

use std::io;

/// Closed set of failure kinds the rest of the crate reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Connection-level failure that a retry may fix (timeout, reset, closed, server restarting)
    Transient,
    /// Insert or update rejected by a unique constraint
    UniqueViolation,
    /// Everything else: constraint violations, syntax errors, decode errors
    Permanent,
}

impl StoreErrorKind {
    pub fn is_transient(self) -> bool {
        self == StoreErrorKind::Transient
    }
}

/// SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATEs for `admin_shutdown`, `crash_shutdown` and `cannot_connect_now`
/// ("the database system is starting up")
const TRANSIENT_SQLSTATES: &[&str] = &["57P01", "57P02", "57P03"];

/// Lowercased message fragments that mark a dropped or stalled connection
const TRANSIENT_MESSAGES: &[&str] = &[
    "connection terminated",
    "connection closed",
    "timeout",
    "timed out",
];

/// Classify a failure from its SQLSTATE code (if any) and message
///
/// This is the whole policy in one place; [`classify`] only extracts the
/// parts from an `sqlx::Error`.
pub fn classify_parts(code: Option<&str>, message: &str) -> StoreErrorKind {
    if let Some(code) = code {
        if code == UNIQUE_VIOLATION {
            return StoreErrorKind::UniqueViolation;
        }
        if TRANSIENT_SQLSTATES.contains(&code) {
            return StoreErrorKind::Transient;
        }
    }

    let message = message.to_lowercase();
    if TRANSIENT_MESSAGES
        .iter()
        .any(|fragment| message.contains(fragment))
    {
        return StoreErrorKind::Transient;
    }

    StoreErrorKind::Permanent
}

/// Socket errors equivalent to ETIMEDOUT, ECONNREFUSED and ECONNRESET
pub fn is_transient_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

/// Classify an sqlx error
pub fn classify(err: &sqlx::Error) -> StoreErrorKind {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
            StoreErrorKind::Transient
        }
        sqlx::Error::Io(e) if is_transient_io(e.kind()) => StoreErrorKind::Transient,
        sqlx::Error::Io(e) => classify_parts(None, &e.to_string()),
        sqlx::Error::Tls(e) => classify_parts(None, &e.to_string()),
        sqlx::Error::Protocol(msg) => classify_parts(None, msg),
        sqlx::Error::Database(db) => classify_parts(db.code().as_deref(), db.message()),
        _ => StoreErrorKind::Permanent,
    }
}
