/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and availability check
/// - `todos`: Todo CRUD for the session user

pub mod auth;
pub mod health;
pub mod todos;
