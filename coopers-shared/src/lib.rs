//! # Coopers Shared Library
//!
//! Types and persistence used by both the Coopers API server and its client.
//!
//! ## Module Organization
//!
//! - `models`: Users and todos with their SQL queries
//! - `auth`: Password hashing and session tokens
//! - `db`: Connection pool and migrations
//! - `dto`: JSON request/response bodies shared with the client

pub mod auth;
pub mod db;
pub mod dto;
pub mod models;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
