/// Middleware for the API server
///
/// - `security`: response security headers
/// - `session`: bearer session authentication for task routes

pub mod security;
pub mod session;
