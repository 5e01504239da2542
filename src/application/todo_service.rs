use crate::domain::repository::TodoRepository;
use crate::domain::todo::{CreateTodo, NewTodo, Todo, TodoId};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("title required")]
    Validation,
    #[error("todo {0} not found")]
    NotFound(TodoId),
    #[error("storage failure")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<Todo>>;
    async fn create(&self, input: CreateTodo) -> Result<Todo>;
    async fn delete(&self, id: TodoId) -> Result<()>;
    async fn toggle(&self, id: TodoId) -> Result<Todo>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn list(&self) -> Result<Vec<Todo>> { Ok(self.repo.list().await?) }

    async fn create(&self, input: CreateTodo) -> Result<Todo> {
        let new = NewTodo::parse(input.title.as_deref()).ok_or(ServiceError::Validation)?;
        let todo = self.repo.create(new).await?;
        tracing::info!(id = %todo.id, "todo created");
        Ok(todo)
    }

    async fn delete(&self, id: TodoId) -> Result<()> {
        if !self.repo.delete(id).await? { return Err(ServiceError::NotFound(id)); }
        tracing::info!(%id, "todo deleted");
        Ok(())
    }

    async fn toggle(&self, id: TodoId) -> Result<Todo> {
        let todo = self.repo.toggle(id).await?.ok_or(ServiceError::NotFound(id))?;
        tracing::info!(%id, completed = todo.completed, "todo toggled");
        Ok(todo)
    }
}
