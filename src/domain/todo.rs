use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct TodoId(pub u64);

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TodoId {
    /// Accepts plain decimal digits only; no sign, no whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) { return None; }
        s.parse::<u64>().ok().map(TodoId)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
}

/// Request payload for creating a todo. `title` stays optional here so that a
/// missing field reaches validation instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTodo {
    pub title: Option<String>,
}

/// A todo that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    title: String,
}

impl NewTodo {
    /// Rejects missing and whitespace-only titles; the title is kept as given.
    pub fn parse(title: Option<&str>) -> Option<Self> {
        let title = title?;
        if title.trim().is_empty() { return None; }
        Some(Self { title: title.to_string() })
    }

    pub fn title(&self) -> &str { &self.title }

    pub fn into_todo(self, id: TodoId) -> Todo {
        Todo { id, title: self.title, completed: false }
    }
}

/// Hands out ids that never go backwards, even when the record holding the
/// highest id is deleted. `next` is `None` once `u64::MAX` has been handed
/// out or seen.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: Option<u64>,
}

impl Default for IdAllocator {
    fn default() -> Self { Self { next: Some(1) } }
}

impl IdAllocator {
    /// Advances the counter past every id in `todos`.
    pub fn observe(&mut self, todos: &[Todo]) {
        if let Some(max) = todos.iter().map(|t| t.id.0).max() {
            self.next = match (self.next, max.checked_add(1)) {
                (Some(next), Some(after)) => Some(next.max(after)),
                _ => None,
            };
        }
    }

    /// `None` when the id space is exhausted.
    pub fn allocate(&mut self) -> Option<TodoId> {
        let id = self.next?;
        self.next = id.checked_add(1);
        Some(TodoId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: u64) -> Todo { Todo { id: TodoId(id), title: format!("t{id}"), completed: false } }

    #[test]
    fn allocator_starts_at_one() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.allocate(), Some(TodoId(1)));
        assert_eq!(ids.allocate(), Some(TodoId(2)));
    }

    #[test]
    fn allocator_does_not_reuse_after_highest_is_removed() {
        let mut ids = IdAllocator::default();
        let mut todos: Vec<Todo> = (0..3).map(|_| todo(ids.allocate().unwrap().0)).collect();
        todos.retain(|t| t.id != TodoId(3));
        ids.observe(&todos);
        assert_eq!(ids.allocate(), Some(TodoId(4)));
    }

    #[test]
    fn allocator_catches_up_with_existing_ids() {
        let mut ids = IdAllocator::default();
        ids.observe(&[todo(7), todo(2)]);
        assert_eq!(ids.allocate(), Some(TodoId(8)));
    }

    #[test]
    fn allocator_stops_at_the_top_of_the_id_space() {
        let mut ids = IdAllocator::default();
        ids.observe(&[todo(u64::MAX)]);
        assert_eq!(ids.allocate(), None);

        let mut ids = IdAllocator::default();
        ids.observe(&[todo(u64::MAX - 1)]);
        assert_eq!(ids.allocate(), Some(TodoId(u64::MAX)));
        assert_eq!(ids.allocate(), None);
        ids.observe(&[todo(3)]);
        assert_eq!(ids.allocate(), None);
    }

    #[test]
    fn new_todo_rejects_missing_and_blank_titles() {
        assert_eq!(NewTodo::parse(None), None);
        assert_eq!(NewTodo::parse(Some("")), None);
        assert_eq!(NewTodo::parse(Some("   ")), None);
        assert_eq!(NewTodo::parse(Some("  milk ")).map(|t| t.title().to_string()), Some("  milk ".into()));
    }

    #[test]
    fn todo_id_parses_plain_digits_only() {
        assert_eq!(TodoId::parse("12"), Some(TodoId(12)));
        assert_eq!(TodoId::parse("0"), Some(TodoId(0)));
        assert_eq!(TodoId::parse("+1"), None);
        assert_eq!(TodoId::parse("-1"), None);
        assert_eq!(TodoId::parse(" 1"), None);
        assert_eq!(TodoId::parse(""), None);
        assert_eq!(TodoId::parse("abc"), None);
        assert_eq!(TodoId::parse("99999999999999999999999"), None);
    }

    #[test]
    fn todo_serializes_flat() {
        let json = serde_json::to_value(todo(5)).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 5, "title": "t5", "completed": false }));
    }
}
