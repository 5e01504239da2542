use async_trait::async_trait;
use super::todo::{NewTodo, Todo, TodoId};

/// Storage backend for todos. Implementations keep insertion order and never
/// hand out an id twice within their lifetime.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn list(&self) -> anyhow::Result<Vec<Todo>>;
    async fn create(&self, input: NewTodo) -> anyhow::Result<Todo>;
    /// Returns `false` when no todo has `id`.
    async fn delete(&self, id: TodoId) -> anyhow::Result<bool>;
    /// Flips `completed`; `None` when no todo has `id`.
    async fn toggle(&self, id: TodoId) -> anyhow::Result<Option<Todo>>;
}
