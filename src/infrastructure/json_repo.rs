use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::{fs, sync::Mutex};

use crate::domain::{
    repository::TodoRepository,
    todo::{IdAllocator, NewTodo, Todo, TodoId},
};

/// Keeps the whole collection as a pretty-printed JSON array in one file.
///
/// Every mutation reloads the file, applies the change and writes the full
/// array back through a temporary sibling that is renamed over the original.
/// The mutex serializes mutations inside this process only.
#[derive(Clone)]
pub struct JsonFileTodoRepository {
    path: PathBuf,
    ids: Arc<Mutex<IdAllocator>>,
}

impl JsonFileTodoRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), ids: Arc::new(Mutex::new(IdAllocator::default())) }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Absent file reads as empty; anything else that goes wrong is an error.
    async fn load(&self) -> Result<Vec<Todo>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
        };
        let todos: Vec<Todo> = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), count = todos.len(), "loaded todos");
        Ok(todos)
    }

    async fn save(&self, todos: &[Todo]) -> Result<()> {
        let content = serde_json::to_vec_pretty(todos)?;
        let tmp = tmp_path(&self.path);
        fs::write(&tmp, content).await.with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).await.with_context(|| format!("replacing {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), count = todos.len(), "saved todos");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl TodoRepository for JsonFileTodoRepository {
    async fn init(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() { fs::create_dir_all(parent).await?; }
        }
        let mut ids = self.ids.lock().await;
        match self.load().await {
            Ok(todos) => ids.observe(&todos),
            Err(e) => tracing::warn!(path = %self.path.display(), error = %format!("{e:#}"), "todo file unreadable"),
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Todo>> {
        match self.load().await {
            Ok(todos) => Ok(todos),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %format!("{e:#}"), "todo file unreadable, listing as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn create(&self, input: NewTodo) -> Result<Todo> {
        let mut ids = self.ids.lock().await;
        let mut todos = self.load().await?;
        ids.observe(&todos);
        let id = ids.allocate().context("todo id space exhausted")?;
        let todo = input.into_todo(id);
        todos.push(todo.clone());
        self.save(&todos).await?;
        Ok(todo)
    }

    async fn delete(&self, id: TodoId) -> Result<bool> {
        let _guard = self.ids.lock().await;
        let mut todos = self.load().await?;
        let before = todos.len();
        todos.retain(|t| t.id != id);
        if todos.len() == before { return Ok(false); }
        self.save(&todos).await?;
        Ok(true)
    }

    async fn toggle(&self, id: TodoId) -> Result<Option<Todo>> {
        let _guard = self.ids.lock().await;
        let mut todos = self.load().await?;
        let Some(todo) = todos.iter_mut().find(|t| t.id == id) else { return Ok(None) };
        todo.completed = !todo.completed;
        let updated = todo.clone();
        self.save(&todos).await?;
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new(title: &str) -> NewTodo { NewTodo::parse(Some(title)).unwrap() }

    async fn repo_in(dir: &TempDir) -> JsonFileTodoRepository {
        let repo = JsonFileTodoRepository::new(dir.path().join("data").join("todos.json"));
        repo.init().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn absent_file_lists_empty() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir).await;
        assert!(repo.list().await.unwrap().is_empty());
        assert!(!repo.path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_lists_empty_but_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir).await;
        std::fs::write(repo.path(), "{not json").unwrap();
        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.create(new("x")).await.is_err());
        assert_eq!(std::fs::read_to_string(repo.path()).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn writes_pretty_array() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir).await;
        repo.create(new("milk")).await.unwrap();
        let content = std::fs::read_to_string(repo.path()).unwrap();
        assert_eq!(content, "[\n  {\n    \"id\": 1,\n    \"title\": \"milk\",\n    \"completed\": false\n  }\n]");
        assert!(!tmp_path(repo.path()).exists());
    }

    #[tokio::test]
    async fn toggle_and_delete_persist() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir).await;
        let a = repo.create(new("a")).await.unwrap();
        let b = repo.create(new("b")).await.unwrap();
        assert!(repo.toggle(a.id).await.unwrap().unwrap().completed);
        assert!(repo.delete(b.id).await.unwrap());
        assert_eq!(repo.toggle(b.id).await.unwrap(), None);

        let reopened = repo_in(&dir).await;
        let todos = reopened.list().await.unwrap();
        assert_eq!(todos, vec![Todo { id: a.id, title: "a".into(), completed: true }]);
    }

    #[tokio::test]
    async fn ids_continue_from_existing_file() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir).await;
        for t in ["a", "b", "c"] { repo.create(new(t)).await.unwrap(); }
        repo.delete(TodoId(3)).await.unwrap();
        assert_eq!(repo.create(new("d")).await.unwrap().id, TodoId(4));

        let reopened = repo_in(&dir).await;
        assert_eq!(reopened.create(new("e")).await.unwrap().id, TodoId(5));
    }

    #[tokio::test]
    async fn picks_up_external_edits() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir).await;
        std::fs::write(repo.path(), r#"[{"id": 10, "title": "seeded", "completed": true}]"#).unwrap();
        let created = repo.create(new("next")).await.unwrap();
        assert_eq!(created.id, TodoId(11));
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_creates_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir).await;
        let handles: Vec<_> = (0..20).map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.create(new(&format!("t{i}"))).await.unwrap() })
        }).collect();
        for handle in handles { handle.await.unwrap(); }

        let on_disk: Vec<Todo> = serde_json::from_str(&std::fs::read_to_string(repo.path()).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 20);
        let mut ids: Vec<u64> = on_disk.iter().map(|t| t.id.0).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn exhausted_id_space_fails_create_without_panicking() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        let seeded = format!(r#"[{{"id": {}, "title": "last", "completed": false}}]"#, u64::MAX);
        std::fs::write(&path, &seeded).unwrap();

        let repo = JsonFileTodoRepository::new(&path);
        repo.init().await.unwrap();
        assert!(repo.create(new("next")).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), seeded);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }
}
