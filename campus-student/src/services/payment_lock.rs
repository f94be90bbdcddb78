//! Payment-mode lock
//!
//! A student's first choice between lump-sum and instalment payment for a
//! batch is recorded once and never changes. Locks without an enrollment
//! context live under a separate `global` scope; the two scopes never mix.

use campus_common::db::models::PaymentLock;
use campus_common::{ids, Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::db::lock_wait::LockWait;
use crate::db::{enrollments, payment_locks};

/// Scope key used when no enrollment is involved
pub const GLOBAL_SCOPE: &str = "global";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Full,
    Emi,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Full => "full",
            PaymentType::Emi => "emi",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(PaymentType::Full),
            "emi" => Ok(PaymentType::Emi),
            other => Err(Error::InvalidInput(format!(
                "Invalid payment_type '{}', expected 'full' or 'emi'",
                other
            ))),
        }
    }
}

/// Partition a lock lives in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockScope {
    Batch(String),
    Global,
}

impl LockScope {
    pub fn key(&self) -> &str {
        match self {
            LockScope::Batch(batch_id) => batch_id,
            LockScope::Global => GLOBAL_SCOPE,
        }
    }
}

/// Scope for an optional enrollment id
///
/// An enrollment id resolves to its batch; an unknown id is `NotFound`.
pub async fn resolve_scope(pool: &SqlitePool, enrollment_id: Option<&str>) -> Result<LockScope> {
    match enrollment_id.map(str::trim).filter(|id| !id.is_empty()) {
        None => Ok(LockScope::Global),
        Some(enrollment_id) => match enrollments::get(pool, enrollment_id).await? {
            Some(enrollment) => Ok(LockScope::Batch(enrollment.batch_id)),
            None => Err(Error::NotFound(format!(
                "Enrollment not found: {}",
                enrollment_id
            ))),
        },
    }
}

#[derive(Debug, Clone)]
pub enum LockOutcome {
    Acquired(PaymentLock),
    AlreadyLocked(PaymentLock),
}

/// Record the payment mode for (student, scope), once
///
/// Any second request for the same key is refused, even with the same
/// payment type. Concurrent first requests race on the unique key; exactly
/// one of them inserts.
pub async fn acquire_lock(
    pool: &SqlitePool,
    lock_wait: LockWait,
    register_number: &str,
    scope: &LockScope,
    payment_type: PaymentType,
) -> Result<LockOutcome> {
    let lock_id = ids::generate();
    let inserted = lock_wait
        .write("payment lock", || {
            payment_locks::insert_if_absent(
                pool,
                lock_id.as_str(),
                register_number,
                scope.key(),
                payment_type.as_str(),
            )
        })
        .await?;

    let lock = payment_locks::find(pool, register_number, scope.key())
        .await?
        .ok_or_else(|| Error::Internal("Payment lock vanished after insert".to_string()))?;

    if inserted {
        info!(register_number, scope = scope.key(), %payment_type, "Payment mode locked");
        Ok(LockOutcome::Acquired(lock))
    } else {
        warn!(
            register_number,
            scope = scope.key(),
            requested = %payment_type,
            existing = %lock.payment_type,
            "Payment lock already set"
        );
        Ok(LockOutcome::AlreadyLocked(lock))
    }
}

pub async fn get_lock(
    pool: &SqlitePool,
    register_number: &str,
    scope: &LockScope,
) -> Result<Option<PaymentLock>> {
    payment_locks::find(pool, register_number, scope.key()).await
}

/// Refusal of an order whose payment type contradicts the lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockMismatch {
    pub locked: String,
    pub requested: PaymentType,
}

/// Check a new order against any existing lock
///
/// No lock means the order may proceed.
pub async fn check_order(
    pool: &SqlitePool,
    register_number: &str,
    scope: &LockScope,
    requested: PaymentType,
) -> Result<std::result::Result<(), LockMismatch>> {
    match get_lock(pool, register_number, scope).await? {
        Some(lock) if lock.payment_type != requested.as_str() => {
            warn!(
                register_number,
                scope = scope.key(),
                locked = %lock.payment_type,
                %requested,
                "Order refused: payment type differs from locked mode"
            );
            Ok(Err(LockMismatch {
                locked: lock.payment_type,
                requested,
            }))
        }
        _ => Ok(Ok(())),
    }
}
