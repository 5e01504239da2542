use std::{fs, path::Path, str::FromStr, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};

use crate::domain::{
    repository::TodoRepository,
    todo::{NewTodo, Todo, TodoId},
};

/// SQLite-backed store. `AUTOINCREMENT` keeps ids from ever being reused.
#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoRepository {
    /// Opens `database_url`, creating the database file and its directory when missing.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new();
        // Every connection to `:memory:` is its own database, so keep exactly one alive.
        let pool = match database_file(database_url) {
            None => pool.max_connections(1).idle_timeout(None).max_lifetime(None),
            Some(file) => {
                if let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) {
                    fs::create_dir_all(dir)?;
                }
                pool.max_connections(5)
            }
        };
        let pool = pool.connect_with(options).await?;
        Ok(Self { pool: Arc::new(pool) })
    }

    async fn get(&self, key: i64) -> Result<Option<Todo>> {
        let row = sqlx::query("SELECT id, title, completed FROM todos WHERE id = ?1")
            .bind(key)
            .fetch_optional(&*self.pool)
            .await?;
        row.map(row_to_todo).transpose()
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&*self.pool).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Todo>> {
        let rows = sqlx::query("SELECT id, title, completed FROM todos ORDER BY id ASC")
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_todo).collect()
    }

    async fn create(&self, input: NewTodo) -> Result<Todo> {
        let result = sqlx::query("INSERT INTO todos (title, completed) VALUES (?1, 0)")
            .bind(input.title())
            .execute(&*self.pool)
            .await?;
        let id = TodoId(u64::try_from(result.last_insert_rowid())?);
        tracing::debug!(%id, "inserted todo");
        Ok(input.into_todo(id))
    }

    async fn delete(&self, id: TodoId) -> Result<bool> {
        let Ok(key) = i64::try_from(id.0) else { return Ok(false) };
        let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(key)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle(&self, id: TodoId) -> Result<Option<Todo>> {
        let Ok(key) = i64::try_from(id.0) else { return Ok(None) };
        let result = sqlx::query("UPDATE todos SET completed = NOT completed WHERE id = ?1")
            .bind(key)
            .execute(&*self.pool)
            .await?;
        if result.rows_affected() == 0 { return Ok(None); }
        self.get(key).await
    }
}

fn row_to_todo(row: SqliteRow) -> Result<Todo> {
    let id: i64 = row.try_get("id")?;
    let title: String = row.try_get("title")?;
    let completed: bool = row.try_get("completed")?;
    Ok(Todo { id: TodoId(u64::try_from(id)?), title, completed })
}

/// Filesystem path behind a `sqlite:` URL; `None` for in-memory databases.
fn database_file(database_url: &str) -> Option<&Path> {
    let rest = database_url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let file = rest.split('?').next().unwrap_or(rest);
    if file.is_empty() || file == ":memory:" || database_url.contains("mode=memory") { return None; }
    Some(Path::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_repo() -> SqliteTodoRepository {
        let repo = SqliteTodoRepository::connect("sqlite::memory:").await.unwrap();
        repo.init().await.unwrap();
        repo
    }

    fn new(title: &str) -> NewTodo { NewTodo::parse(Some(title)).unwrap() }

    #[tokio::test]
    async fn create_list_toggle_delete() {
        let repo = memory_repo().await;
        let a = repo.create(new("a")).await.unwrap();
        let b = repo.create(new("b")).await.unwrap();
        assert_eq!(repo.list().await.unwrap(), vec![a.clone(), b.clone()]);

        assert!(repo.toggle(a.id).await.unwrap().unwrap().completed);
        assert!(!repo.toggle(a.id).await.unwrap().unwrap().completed);
        assert_eq!(repo.toggle(TodoId(99)).await.unwrap(), None);

        assert!(repo.delete(b.id).await.unwrap());
        assert!(!repo.delete(b.id).await.unwrap());
        assert_eq!(repo.list().await.unwrap(), vec![a]);
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        let repo = memory_repo().await;
        for t in ["a", "b", "c"] { repo.create(new(t)).await.unwrap(); }
        assert!(repo.delete(TodoId(3)).await.unwrap());
        assert_eq!(repo.create(new("d")).await.unwrap().id, TodoId(4));
    }

    #[test]
    fn database_file_from_url() {
        assert_eq!(database_file("sqlite::memory:"), None);
        assert_eq!(database_file("sqlite://todos.db"), Some(Path::new("todos.db")));
        assert_eq!(database_file("sqlite:data/todos.db?mode=rwc"), Some(Path::new("data/todos.db")));
        assert_eq!(database_file("sqlite:///var/lib/todos.db"), Some(Path::new("/var/lib/todos.db")));
    }

    #[tokio::test]
    async fn ids_beyond_the_sqlite_range_are_absent() {
        let repo = memory_repo().await;
        repo.create(new("a")).await.unwrap();
        assert!(!repo.delete(TodoId(u64::MAX)).await.unwrap());
        assert_eq!(repo.toggle(TodoId(u64::MAX)).await.unwrap(), None);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn file_database_is_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("todos.db");
        let url = format!("sqlite://{}", path.display());
        let repo = SqliteTodoRepository::connect(&url).await.unwrap();
        repo.init().await.unwrap();
        repo.create(new("persisted")).await.unwrap();
        assert!(path.exists());

        let reopened = SqliteTodoRepository::connect(&url).await.unwrap();
        reopened.init().await.unwrap();
        assert_eq!(reopened.list().await.unwrap().len(), 1);
    }
}
