/// Two-column task board
///
/// `TaskBoard` holds the caller's todos split into `pending` and `done`
/// lists and keeps them in step with a [`TodoStore`].
///
/// Ordering inside a list is view-local: drag moves are never persisted and
/// a reload restores the store's newest-first order.
///
/// Toggling is optimistic. The item moves to the end of the other list
/// before the store call, and a failed call leaves it there; the error is
/// returned and the next `load` reconciles.

use crate::{
    api::{ClientError, TodoStore},
    session::SessionCache,
};
use coopers_shared::{
    dto::{CreateTodoRequest, UpdateTodoRequest},
    models::todo::Todo,
};
use uuid::Uuid;

/// Which column a todo is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Not completed
    Pending,
    /// Completed
    Done,
}

impl Column {
    fn of(todo: &Todo) -> Self {
        if todo.completed {
            Column::Done
        } else {
            Column::Pending
        }
    }
}

#[derive(Debug, Clone)]
struct EditState {
    id: Uuid,
    text: String,
}

/// Pending/done view over a todo store
pub struct TaskBoard<S, C> {
    store: S,
    cache: C,
    pending: Vec<Todo>,
    done: Vec<Todo>,
    editing: Option<EditState>,
}

impl<S, C> TaskBoard<S, C>
where
    S: TodoStore,
    C: SessionCache,
{
    /// Creates an empty board; call [`TaskBoard::load`] to fill it
    pub fn new(store: S, cache: C) -> Self {
        Self {
            store,
            cache,
            pending: Vec::new(),
            done: Vec::new(),
            editing: None,
        }
    }

    /// Todos not yet completed, in display order
    pub fn pending(&self) -> &[Todo] {
        &self.pending
    }

    /// Completed todos, in display order
    pub fn done(&self) -> &[Todo] {
        &self.done
    }

    /// The todo being edited and its draft text
    pub fn editing(&self) -> Option<(Uuid, &str)> {
        self.editing.as_ref().map(|e| (e.id, e.text.as_str()))
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Session cache
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Finds a todo on either list
    pub fn find(&self, id: Uuid) -> Option<&Todo> {
        self.pending.iter().chain(self.done.iter()).find(|t| t.id == id)
    }

    fn list_mut(&mut self, column: Column) -> &mut Vec<Todo> {
        match column {
            Column::Pending => &mut self.pending,
            Column::Done => &mut self.done,
        }
    }

    fn locate(&self, id: Uuid) -> Option<(Column, usize)> {
        if let Some(i) = self.pending.iter().position(|t| t.id == id) {
            return Some((Column::Pending, i));
        }
        self.done
            .iter()
            .position(|t| t.id == id)
            .map(|i| (Column::Done, i))
    }

    /// Replaces the local copy of a todo with the stored record, in place
    fn replace(&mut self, todo: Todo) {
        if let Some((column, index)) = self.locate(todo.id) {
            self.list_mut(column)[index] = todo;
        }
    }

    /// Fetches all todos and splits them by completion, keeping store order
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let todos = self.store.list().await?;

        let (done, pending): (Vec<Todo>, Vec<Todo>) = todos
            .into_iter()
            .map(|t| t.todo)
            .partition(|t| t.completed);

        tracing::debug!(pending = pending.len(), done = done.len(), "Board loaded");

        self.pending = pending;
        self.done = done;
        self.editing = None;
        Ok(())
    }

    fn move_within(list: &mut Vec<Todo>, from: usize, to: usize) -> bool {
        if from >= list.len() || to >= list.len() {
            return false;
        }
        let item = list.remove(from);
        list.insert(to, item);
        true
    }

    /// Moves a pending todo from one position to another
    ///
    /// Returns false (and changes nothing) if either index is out of range.
    pub fn move_pending(&mut self, from: usize, to: usize) -> bool {
        Self::move_within(&mut self.pending, from, to)
    }

    /// Moves a done todo from one position to another
    ///
    /// Returns false (and changes nothing) if either index is out of range.
    pub fn move_done(&mut self, from: usize, to: usize) -> bool {
        Self::move_within(&mut self.done, from, to)
    }

    /// Flips a todo's completion and persists it
    ///
    /// The todo moves to the end of the other list first. If the store call
    /// fails the move is kept and the error returned.
    pub async fn toggle(&mut self, id: Uuid) -> Result<Todo, ClientError> {
        let (column, index) = self.locate(id).ok_or(ClientError::UnknownTodo(id))?;

        let mut todo = self.list_mut(column).remove(index);
        todo.completed = !todo.completed;
        self.list_mut(Column::of(&todo)).push(todo.clone());

        let updated = self
            .store
            .update(UpdateTodoRequest {
                id: Some(todo.id),
                content: Some(todo.content.clone()),
                completed: Some(todo.completed),
                version: None,
            })
            .await
            .map_err(|e| {
                tracing::warn!(todo_id = %id, error = %e, "Toggle not persisted");
                e
            })?;

        self.replace(updated.clone());
        Ok(updated)
    }

    /// Starts editing a todo's text
    ///
    /// Returns false if the todo is not on the board.
    pub fn begin_edit(&mut self, id: Uuid) -> bool {
        match self.find(id) {
            Some(todo) => {
                self.editing = Some(EditState {
                    id,
                    text: todo.content.clone(),
                });
                true
            }
            None => false,
        }
    }

    /// Replaces the draft text; nothing is persisted
    pub fn edit_input(&mut self, text: impl Into<String>) {
        if let Some(edit) = self.editing.as_mut() {
            edit.text = text.into();
        }
    }

    /// Abandons the current edit
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Saves the draft text
    ///
    /// Sends the full current item (`id`, `content`, `completed`). Returns
    /// `Ok(None)` when nothing is being edited or the draft is blank; a
    /// blank draft is discarded.
    pub async fn commit_edit(&mut self) -> Result<Option<Todo>, ClientError> {
        let Some(edit) = self.editing.take() else {
            return Ok(None);
        };

        if edit.text.trim().is_empty() {
            tracing::debug!(todo_id = %edit.id, "Discarding blank edit");
            return Ok(None);
        }

        let (column, index) = self.locate(edit.id).ok_or(ClientError::UnknownTodo(edit.id))?;
        let completed = {
            let todo = &mut self.list_mut(column)[index];
            todo.content = edit.text.clone();
            todo.completed
        };

        let updated = self
            .store
            .update(UpdateTodoRequest {
                id: Some(edit.id),
                content: Some(edit.text),
                completed: Some(completed),
                version: None,
            })
            .await?;

        self.replace(updated.clone());
        Ok(Some(updated))
    }

    /// Removes a todo from the board without touching the store
    pub fn remove_local(&mut self, id: Uuid) -> Option<Todo> {
        let (column, index) = self.locate(id)?;
        if self.editing.as_ref().map(|e| e.id) == Some(id) {
            self.editing = None;
        }
        Some(self.list_mut(column).remove(index))
    }

    /// Removes a todo from the board and deletes it from the store
    pub async fn delete(&mut self, id: Uuid) -> Result<(), ClientError> {
        self.remove_local(id);
        self.store.delete(id).await?;
        tracing::debug!(todo_id = %id, "Todo deleted");
        Ok(())
    }

    /// Creates a pending todo for the logged-in user
    ///
    /// The text is trimmed. Blank text, or no valid cached session, is a
    /// no-op returning `Ok(None)`. The stored record is appended to
    /// `pending`.
    pub async fn create(&mut self, text: &str) -> Result<Option<Todo>, ClientError> {
        let content = text.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let Some(session) = self.cache.current()? else {
            tracing::debug!("Not creating todo without a session");
            return Ok(None);
        };

        let todo = self
            .store
            .create(CreateTodoRequest {
                content: Some(content.to_string()),
                completed: Some(false),
                user_id: Some(session.user_id()),
            })
            .await?;

        self.pending.push(todo.clone());
        Ok(Some(todo))
    }

    /// Empties the pending list locally
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Empties the done list locally
    pub fn clear_done(&mut self) {
        self.done.clear();
    }
}
