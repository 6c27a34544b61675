//! # Lingua Common Library
//!
//! Shared code for the Lingua backend service including:
//! - Domain models (users, progress records, catalogs, sessions)
//! - Database layer (SQLite via sqlx)
//! - SM-2 spaced repetition scheduling
//! - JWT issuing/verification and password hashing
//! - Configuration loading

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod srs;

pub use error::{Error, Result};
