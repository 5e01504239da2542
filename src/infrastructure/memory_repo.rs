use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    repository::TodoRepository,
    todo::{IdAllocator, NewTodo, Todo, TodoId},
};

#[derive(Default)]
struct State {
    todos: Vec<Todo>,
    ids: IdAllocator,
}

/// Process-scoped store. Clones share the same collection.
#[derive(Clone, Default)]
pub struct InMemoryTodoRepository {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn init(&self) -> Result<()> { Ok(()) }

    async fn list(&self) -> Result<Vec<Todo>> { Ok(self.state.lock().await.todos.clone()) }

    async fn create(&self, input: NewTodo) -> Result<Todo> {
        let mut state = self.state.lock().await;
        let id = state.ids.allocate().context("todo id space exhausted")?;
        let todo = input.into_todo(id);
        state.todos.push(todo.clone());
        Ok(todo)
    }

    async fn delete(&self, id: TodoId) -> Result<bool> {
        let mut state = self.state.lock().await;
        let before = state.todos.len();
        state.todos.retain(|t| t.id != id);
        Ok(state.todos.len() != before)
    }

    async fn toggle(&self, id: TodoId) -> Result<Option<Todo>> {
        let mut state = self.state.lock().await;
        Ok(state.todos.iter_mut().find(|t| t.id == id).map(|t| {
            t.completed = !t.completed;
            t.clone()
        }))
    }
}
