use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{Id, Post, Resource, User};

const SEED: &str = include_str!("../../fixtures/db.json");

/// A record type kept in a [`RecordStore`].
pub trait Record: Clone + Serialize + DeserializeOwned + 'static {
    const RESOURCE: Resource;

    fn id(&self) -> Id;
    fn table(store: &RecordStore) -> &Table<Self>;
    fn table_mut(store: &mut RecordStore) -> &mut Table<Self>;
}

impl Record for User {
    const RESOURCE: Resource = Resource::Users;
    fn id(&self) -> Id {
        self.id
    }
    fn table(store: &RecordStore) -> &Table<Self> {
        &store.users
    }
    fn table_mut(store: &mut RecordStore) -> &mut Table<Self> {
        &mut store.users
    }
}

impl Record for Post {
    const RESOURCE: Resource = Resource::Posts;
    fn id(&self) -> Id {
        self.id
    }
    fn table(store: &RecordStore) -> &Table<Self> {
        &store.posts
    }
    fn table_mut(store: &mut RecordStore) -> &mut Table<Self> {
        &mut store.posts
    }
}

/// Rows of one resource in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table<T>(Vec<T>);

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Record> Table<T> {
    pub fn rows(&self) -> &[T] {
        &self.0
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn get(&self, id: Id) -> Option<&T> {
        self.0.iter().find(|r| r.id() == id)
    }
    pub fn contains(&self, id: Id) -> bool {
        self.get(id).is_some()
    }
    pub fn push(&mut self, record: T) {
        self.0.push(record);
    }
    /// Replaces the row with the same id in place, or appends `record`.
    pub fn upsert(&mut self, record: T) {
        match self.0.iter_mut().find(|r| r.id() == record.id()) {
            Some(row) => *row = record,
            None => self.0.push(record),
        }
    }
    pub fn remove(&mut self, id: Id) -> Option<T> {
        let index = self.0.iter().position(|r| r.id() == id)?;
        Some(self.0.remove(index))
    }

    /// Rows whose JSON fields equal every `(key, value)` pair.
    pub fn filter(&self, filters: &[(String, String)]) -> Vec<T> {
        self.0
            .iter()
            .filter(|r| {
                let Ok(Value::Object(fields)) = serde_json::to_value(*r) else {
                    return false;
                };
                filters
                    .iter()
                    .all(|(key, value)| fields.get(key).is_some_and(|f| field_eq(f, value)))
            })
            .cloned()
            .collect()
    }
}

fn field_eq(field: &Value, value: &str) -> bool {
    match field {
        Value::String(s) => s == value,
        Value::Number(n) => n.to_string() == value,
        Value::Bool(b) => b.to_string() == value,
        Value::Null => value == "null",
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// In-memory backing store of the mock host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordStore {
    users: Table<User>,
    posts: Table<Post>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store loaded from the embedded `fixtures/db.json`.
    pub fn seeded() -> Result<Self, serde_json::Error> {
        Self::from_json(SEED)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn table<T: Record>(&self) -> &Table<T> {
        T::table(self)
    }
    pub fn table_mut<T: Record>(&mut self) -> &mut Table<T> {
        T::table_mut(self)
    }
}
