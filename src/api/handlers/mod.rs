//! API request handlers.
//!
//! Resource handlers follow the same order of checks: authenticate (401),
//! load the resource (404), then apply the ownership rules (403).

/// Articles CRUD.
pub mod articles;
/// Registration and login.
pub mod auth;
/// Simulations CRUD and likes.
pub mod simulations;
/// User profiles.
pub mod users;
