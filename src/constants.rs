/// Minimum accepted password length at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// bcrypt work factor used when `BCRYPT_COST` is not set
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Token lifetime used when `TOKEN_TTL_HOURS` is not set
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Shortest signing secret accepted at startup (HS256 key size)
pub const MIN_JWT_SECRET_LEN: usize = 32;

// =============================================================================
// Database
// =============================================================================

/// Retries per query after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Backoff before the first retry, doubled on each further attempt
pub const RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Upper bound for a single backoff
pub const RETRY_MAX_DELAY_MS: u64 = 5_000;

pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const POOL_IDLE_TIMEOUT_SECS: u64 = 30;
pub const POOL_ACQUIRE_TIMEOUT_SECS: u64 = 20;

/// Transaction-mode poolers (port 6543) get a longer acquire window
pub const POOLER_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub const POOLER_PORT: u16 = 6543;

/// Startup connectivity probe: attempts and pause between them
pub const STARTUP_PROBE_ATTEMPTS: u32 = 3;
pub const STARTUP_PROBE_DELAY_SECS: u64 = 2;

/// Seconds advertised in `Retry-After` when the database is unavailable
pub const RETRY_AFTER_SECS: u64 = 5;

/// Upper bound on the health endpoint's database ping
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_MS: u64 = 2000;

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_CREDENTIALS_REQUIRED: &str = "Username and password are required";

pub const ERR_PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

pub const ERR_SUBJECT_NAME_REQUIRED: &str = "Subject name is required";

pub const ERR_QUESTION_FIELDS_REQUIRED: &str = "Question text and answer text are required";

/// Returned to clients while the database cannot be reached
pub const ERR_DB_UNAVAILABLE_DETAIL: &str =
    "Unable to connect to the database. Please check your connection settings or use the connection pooler.";
