//! PostgreSQL seat reservation and reconciliation engine.
//!
//! This crate owns every write to course availability. Each public
//! operation — request intake, decision, promotion reassignment — runs
//! inside exactly one database transaction:
//!
//! - **Guarded decrements** (`UPDATE ... WHERE seats_available > 0`) are the
//!   race-breaker: a zero affected-row count means the caller lost a
//!   capacity race and the whole transaction aborts with a conflict.
//! - **Reconciliation** ([`ledger::reconcile_seats`]) then recomputes
//!   `seats_available` from the underlying request/enrollment sets before
//!   commit, so incremental arithmetic is never trusted across code paths.
//!
//! Operations return the [`SeatChange`] events they produced; callers
//! publish them after commit, never before.
//!
//! [`SeatChange`]: enroll_core::SeatChange

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use enroll_core::{EnrollmentError, RequestStatus, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod catalog;
pub mod decision;
pub mod intake;
pub mod ledger;
pub mod reassign;

mod promotion_guard;

pub use catalog::{CourseAvailability, NewCourse, NewPromotion, PromotionDetail, RequestDetail};
pub use decision::DecisionOutcome;
pub use intake::{CreatedRequest, NewRequest};
pub use reassign::ReassignmentOutcome;

/// Connection options for the enrollment database.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Maximum connections in the pool.
    pub max_connections: u32,
    /// Minimum idle connections kept open.
    pub min_connections: u32,
    /// Timeout for acquiring a connection, in seconds.
    pub connect_timeout: u64,
}

impl StoreOptions {
    /// Options with default pool sizing for the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout: 30,
        }
    }
}

/// The enrollment store.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct EnrollmentStore {
    pool: PgPool,
}

impl EnrollmentStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to PostgreSQL with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::Database`] if the pool cannot be
    /// established.
    pub async fn connect(options: &StoreOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .min_connections(options.min_connections)
            .acquire_timeout(Duration::from_secs(options.connect_timeout))
            .connect(&options.url)
            .await
            .map_err(|e| EnrollmentError::Database(format!("Failed to connect: {e}")))?;
        Ok(Self { pool })
    }

    /// Run embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| EnrollmentError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Access the underlying connection pool.
    ///
    /// Useful for health checks or manual queries.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Parse a request status column, treating unknown text as corruption.
pub(crate) fn parse_request_status(s: &str) -> Result<RequestStatus> {
    RequestStatus::parse(s)
        .ok_or_else(|| EnrollmentError::Database(format!("Unknown request status in row: {s}")))
}
