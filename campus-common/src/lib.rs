//! # Campus Common Library
//!
//! Shared code for the campus services including:
//! - Database bootstrap, migrations and row models
//! - Configuration loading
//! - Calendar-date and identifier helpers

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod time;

pub use error::{Error, Result};
