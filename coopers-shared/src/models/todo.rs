/// Todo model and database operations
///
/// This module provides the task store: to-do entries owned by exactly one
/// user. Every query that reads or mutates a single entry is scoped by its
/// owner, so a task is only reachable through its owner's session.
///
/// # State Machine
///
/// ```text
/// pending --complete--> completed
/// completed --uncomplete--> pending
/// ```
///
/// Content is editable in either state. Deletion removes the row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE todos (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     content TEXT NOT NULL CHECK (length(content) > 0),
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     version BIGINT NOT NULL DEFAULT 1,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use coopers_shared::models::todo::{CreateTodo, Todo, UpdateTodo, UpdateOutcome};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
/// let todo = Todo::create(&pool, CreateTodo {
///     content: "buy milk".to_string(),
///     completed: false,
///     user_id: owner,
/// }).await?;
///
/// let outcome = Todo::update(&pool, todo.id, owner, UpdateTodo {
///     completed: Some(true),
///     ..Default::default()
/// }).await?;
/// assert!(matches!(outcome, UpdateOutcome::Updated(_)));
/// # Ok(())
/// # }
/// ```

use super::user::OwnerSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Completion state of a todo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoState {
    /// Not yet done
    Pending,

    /// Marked done
    Completed,
}

impl TodoState {
    /// Maps the stored `completed` flag to a state
    pub fn from_completed(completed: bool) -> Self {
        if completed {
            TodoState::Completed
        } else {
            TodoState::Pending
        }
    }

    /// Whether this state stores `completed = true`
    pub fn is_completed(&self) -> bool {
        matches!(self, TodoState::Completed)
    }

    /// The state reached by a single complete/uncomplete toggle
    pub fn toggled(&self) -> Self {
        match self {
            TodoState::Pending => TodoState::Completed,
            TodoState::Completed => TodoState::Pending,
        }
    }

    /// Converts state to string for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoState::Pending => "pending",
            TodoState::Completed => "completed",
        }
    }
}

/// Todo row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique todo ID
    pub id: Uuid,

    /// User-editable text (never empty)
    pub content: String,

    /// Completion flag
    pub completed: bool,

    /// Owning user
    pub user_id: Uuid,

    /// Monotonic revision, bumped on every update
    pub version: i64,

    /// When the todo was created (drives list ordering)
    pub created_at: DateTime<Utc>,

    /// When the todo was last updated
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Current completion state
    pub fn state(&self) -> TodoState {
        TodoState::from_completed(self.completed)
    }
}

/// Todo with its owner's public identity, as returned by listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoWithOwner {
    /// The todo itself
    #[serde(flatten)]
    pub todo: Todo,

    /// Owner summary
    pub user: OwnerSummary,
}

#[derive(sqlx::FromRow)]
struct TodoOwnerRow {
    id: Uuid,
    content: String,
    completed: bool,
    user_id: Uuid,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    owner_username: String,
    owner_email: String,
}

impl From<TodoOwnerRow> for TodoWithOwner {
    fn from(row: TodoOwnerRow) -> Self {
        Self {
            user: OwnerSummary {
                id: row.user_id,
                username: row.owner_username,
                email: row.owner_email,
            },
            todo: Todo {
                id: row.id,
                content: row.content,
                completed: row.completed,
                user_id: row.user_id,
                version: row.version,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

/// Input for creating a todo
#[derive(Debug, Clone)]
pub struct CreateTodo {
    /// Todo text
    pub content: String,

    /// Initial completion flag
    pub completed: bool,

    /// Owner (must reference an existing user)
    pub user_id: Uuid,
}

/// Partial update for a todo
///
/// Only `Some` fields are written; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateTodo {
    /// New text
    pub content: Option<String>,

    /// New completion flag
    pub completed: Option<bool>,

    /// Version the caller last saw; `None` means last-writer-wins
    pub expected_version: Option<i64>,
}

impl UpdateTodo {
    /// Whether the update would change at least one field
    pub fn has_changes(&self) -> bool {
        self.content.is_some() || self.completed.is_some()
    }
}

/// Result of a conditional update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The row was updated
    Updated(Todo),

    /// The row exists but its version differs from the expected one
    Conflict {
        /// Version currently stored
        current_version: i64,
    },

    /// No row with that id belongs to the owner
    NotFound,
}

impl Todo {
    /// Creates a todo
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `user_id` does not reference an existing user (foreign key violation)
    /// - `content` is empty (check constraint violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateTodo) -> Result<Self, sqlx::Error> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (content, completed, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, content, completed, user_id, version, created_at, updated_at
            "#,
        )
        .bind(data.content)
        .bind(data.completed)
        .bind(data.user_id)
        .fetch_one(pool)
        .await?;

        Ok(todo)
    }

    /// Finds a todo by ID, scoped to its owner
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, content, completed, user_id, version, created_at, updated_at
            FROM todos
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(todo)
    }

    /// Lists an owner's todos, newest first, with the owner summary attached
    pub async fn list_by_owner(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<TodoWithOwner>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TodoOwnerRow>(
            r#"
            SELECT t.id, t.content, t.completed, t.user_id, t.version,
                   t.created_at, t.updated_at,
                   u.username AS owner_username, u.email AS owner_email
            FROM todos t
            JOIN users u ON u.id = t.user_id
            WHERE t.user_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(TodoWithOwner::from).collect())
    }

    /// Applies a partial update
    ///
    /// The update is a single statement; when `expected_version` is set it only
    /// matches the row at that version. A non-matching row is then looked up to
    /// tell a version conflict apart from a missing todo.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTodo,
    ) -> Result<UpdateOutcome, sqlx::Error> {
        let updated = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET content = COALESCE($3, content),
                completed = COALESCE($4, completed),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1
              AND user_id = $2
              AND ($5::BIGINT IS NULL OR version = $5)
            RETURNING id, content, completed, user_id, version, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(data.content)
        .bind(data.completed)
        .bind(data.expected_version)
        .fetch_optional(pool)
        .await?;

        if let Some(todo) = updated {
            return Ok(UpdateOutcome::Updated(todo));
        }

        match Self::find_by_id_and_owner(pool, id, user_id).await? {
            Some(current) => Ok(UpdateOutcome::Conflict {
                current_version: current.version,
            }),
            None => Ok(UpdateOutcome::NotFound),
        }
    }

    /// Deletes a todo, scoped to its owner
    ///
    /// Returns false if no such todo belongs to the owner.
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
