//! # Coopers Client Library
//!
//! Client side of the Coopers todo service: an HTTP client for the API, a
//! local session cache and the two-column task board view model.
//!
//! ## Modules
//!
//! - `api`: `TodoStore` trait and the reqwest-backed `ApiClient`
//! - `session`: Cached login session (memory or JSON file)
//! - `board`: `TaskBoard`, the pending/done view over a `TodoStore`
//!
//! ## Example
//!
//! ```no_run
//! use coopers_client::{api::ApiClient, board::TaskBoard, session::{MemorySessionCache, Session, SessionCache}};
//!
//! # async fn example() -> Result<(), coopers_client::api::ClientError> {
//! let mut client = ApiClient::new("http://localhost:8080")?;
//! let login = client.login("a", "secret1").await?;
//! client.set_token(Some(login.token.clone()));
//!
//! let cache = MemorySessionCache::new();
//! cache.store(&Session::from(login))?;
//!
//! let mut board = TaskBoard::new(client, cache);
//! board.load().await?;
//! board.create("buy milk").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod board;
pub mod session;
