use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgPool};
use std::time::Duration;

use super::retry::{with_retry, RetryPolicy};
use crate::config::DatabaseConfig;
use crate::constants::{
    POOLER_ACQUIRE_TIMEOUT_SECS, POOLER_PORT, POOL_ACQUIRE_TIMEOUT_SECS, POOL_IDLE_TIMEOUT_SECS,
    STARTUP_PROBE_ATTEMPTS, STARTUP_PROBE_DELAY_SECS,
};

/// Build connection options from either a URL or discrete settings
pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, sqlx::Error> {
    let options = match config {
        DatabaseConfig::Url(url) => url.parse::<PgConnectOptions>()?,
        DatabaseConfig::Discrete {
            host,
            user,
            password,
            name,
            port,
        } => PgConnectOptions::new()
            .host(host)
            .username(user)
            .password(password)
            .database(name)
            .port(*port),
    };

    // transaction-mode poolers cannot keep prepared statements across transactions
    if options.get_port() == POOLER_PORT {
        return Ok(options.statement_cache_capacity(0));
    }

    Ok(options)
}

/// Create the PostgreSQL connection pool
///
/// The pool connects lazily so the server can start while the database is
/// still unreachable. Idle connections are pinged before reuse; a broken one
/// is logged and discarded without affecting the rest of the pool.
pub fn create_pool(config: &DatabaseConfig, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Creating database connection pool...");

    let options = connect_options(config)?;
    let is_pooler = options.get_port() == POOLER_PORT;

    if is_pooler {
        tracing::info!(
            "Using connection pooler (transaction mode) at {}:{}",
            options.get_host(),
            options.get_port()
        );
    } else {
        tracing::info!(
            "Using direct database connection at {}:{}",
            options.get_host(),
            options.get_port()
        );
    }

    let acquire_timeout = if is_pooler {
        POOLER_ACQUIRE_TIMEOUT_SECS
    } else {
        POOL_ACQUIRE_TIMEOUT_SECS
    };

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(acquire_timeout))
        .idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
        .test_before_acquire(false)
        .before_acquire(|conn, meta| {
            Box::pin(async move { Ok(keep_idle_connection(conn.ping().await, meta.idle_for)) })
        })
        .connect_lazy_with(options);

    tracing::info!(
        "Database connection pool created (max {} connections)",
        max_connections
    );

    Ok(pool)
}

/// Whether an idle connection that answered `ping` this way may be reused
///
/// A broken connection is dropped from the pool; the caller gets a fresh one.
fn keep_idle_connection(ping: Result<(), sqlx::Error>, idle_for: Duration) -> bool {
    match ping {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(
                "Unexpected error on idle connection (idle for {:?}), discarding it: {}",
                idle_for,
                e
            );
            false
        }
    }
}

/// Check connectivity at startup, retrying transient failures
///
/// Returns `false` when the database stays unreachable; the caller decides
/// whether to carry on.
pub async fn probe_connection(pool: &PgPool) -> bool {
    let policy = RetryPolicy {
        max_retries: STARTUP_PROBE_ATTEMPTS - 1,
        base_delay: Duration::from_secs(STARTUP_PROBE_DELAY_SECS),
        max_delay: Duration::from_secs(STARTUP_PROBE_DELAY_SECS),
    };

    let result = with_retry(&policy, || {
        sqlx::query_scalar::<_, DateTime<Utc>>("SELECT NOW()").fetch_one(pool)
    })
    .await;

    match result {
        Ok(now) => {
            tracing::info!("Successfully connected to database, server time: {}", now);
            true
        }
        Err(e) => {
            tracing::error!("Failed to connect to database: {}", e);
            tracing::error!(
                "Check DATABASE_URL (e.g. postgres://<user>:<password>@<host>:5432/<db>?sslmode=require) \
                 or DB_HOST/DB_PORT/DB_USER/DB_PASSWORD/DB_NAME; \
                 port 6543 selects the connection pooler"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discrete(port: u16) -> DatabaseConfig {
        DatabaseConfig::Discrete {
            host: "db.example.com".to_string(),
            user: "revisor".to_string(),
            password: "secret".to_string(),
            name: "revisor".to_string(),
            port,
        }
    }

    #[test]
    fn test_connect_options_from_discrete_settings() {
        let options = connect_options(&discrete(5432)).unwrap();
        assert_eq!(options.get_host(), "db.example.com");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_database(), Some("revisor"));
        assert_eq!(options.get_username(), "revisor");
    }

    #[test]
    fn test_connect_options_from_url() {
        let config =
            DatabaseConfig::Url("postgres://app:pw@neon.example.com:5433/notes".to_string());
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "neon.example.com");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("notes"));
    }

    #[test]
    fn test_connect_options_rejects_bad_url() {
        let config = DatabaseConfig::Url("not a url".to_string());
        assert!(connect_options(&config).is_err());
    }

    #[tokio::test]
    async fn test_create_pool_is_lazy() {
        // nothing listens here; a lazy pool must still be created
        let pool = create_pool(&discrete(1), 3).unwrap();
        assert_eq!(pool.size(), 0);
        pool.close().await;
    }

    #[test]
    fn test_idle_connection_kept_when_ping_succeeds() {
        assert!(keep_idle_connection(Ok(()), Duration::from_secs(5)));
    }

    #[test]
    fn test_broken_idle_connection_is_discarded() {
        let reset = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ));
        assert!(!keep_idle_connection(Err(reset), Duration::from_secs(25)));
        assert!(!keep_idle_connection(
            Err(sqlx::Error::PoolClosed),
            Duration::from_secs(1)
        ));
    }
}
