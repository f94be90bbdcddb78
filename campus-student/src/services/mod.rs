//! Business rules behind the HTTP handlers

pub mod attendance;
pub mod enrollment;
pub mod lsrw;
pub mod merge_resolver;
pub mod notifier;
pub mod payment_lock;
pub mod payments;
pub mod profile;
pub mod scoring;
pub mod seat_allocation;
