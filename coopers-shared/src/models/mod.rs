/// Database models for Coopers
///
/// This module contains the two persistent entities and their queries.
///
/// # Models
///
/// - `user`: Credential store (username, email, password hash)
/// - `todo`: Task store (content, completion flag, owner)
///
/// One user owns zero or more todos. Ownership is never transferred or shared.
///
/// # Example
///
/// ```no_run
/// use coopers_shared::models::todo::Todo;
/// use coopers_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(owner: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let todos = Todo::list_by_owner(&pool, owner).await?;
/// println!("{} todos", todos.len());
/// # Ok(())
/// # }
/// ```

pub mod todo;
pub mod user;
