use serde::Serialize;
use serde_json::{Map, Value};

use crate::{ApiError, Fixtures, Id, NewPost, Post, Resource, User};

mod route;
mod store;

pub use route::{Method, Request};
pub use store::*;

use route::Target;

#[cfg(test)]
mod tests;

/// REST-like surface over a [`RecordStore`].
///
/// All operations are synchronous; latency and failures are added by [`MockApi`](crate::MockApi).
pub struct Registry {
    store: RecordStore,
    fixtures: Fixtures,
}

impl Registry {
    pub fn new(store: RecordStore, fixtures: Fixtures) -> Self {
        Self { store, fixtures }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }
    pub fn fixtures(&self) -> &Fixtures {
        &self.fixtures
    }

    pub fn collection<T: Record>(&self) -> Vec<T> {
        self.store.table::<T>().rows().to_vec()
    }

    pub fn get_by_id<T: Record>(&self, id: Id) -> Result<T, ApiError> {
        self.store
            .table::<T>()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found::<T>())
    }

    /// Records whose field `key` equals `value`; empty when nothing matches.
    pub fn filtered<T: Record>(&self, key: &str, value: &str) -> Vec<T> {
        self.store
            .table::<T>()
            .filter(&[(key.to_string(), value.to_string())])
    }

    /// Validates `new`, assigns a fresh id and appends the post.
    pub fn create_post(&mut self, new: NewPost) -> Result<Post, ApiError> {
        new.validate()?;
        let id = self.next_id::<Post>();
        let post = new.into_post(id, self.fixtures.now());
        self.store.table_mut::<Post>().push(post.clone());
        Ok(post)
    }

    /// Stores `record` as-is. A record with the same id is replaced where it stands.
    pub fn insert<T: Record>(&mut self, record: T) {
        self.store.table_mut::<T>().upsert(record);
    }

    pub fn delete<T: Record>(&mut self, id: Id) -> Result<(), ApiError> {
        match self.store.table_mut::<T>().remove(id) {
            Some(_) => Ok(()),
            None => Err(not_found::<T>()),
        }
    }

    fn next_id<T: Record>(&self) -> Id {
        loop {
            let id = self.fixtures.generate_id();
            if !self.store.table::<T>().contains(id) {
                return id;
            }
        }
    }

    /// Answers `request` the way the mock HTTP host would.
    pub fn dispatch(&mut self, request: &Request) -> Result<Value, ApiError> {
        let target = Target::parse(request)?;
        match (request.method, target) {
            (Method::Get, Target::Collection(Resource::Users)) => {
                to_json(self.collection::<User>())
            }
            (Method::Get, Target::Collection(Resource::Posts)) => {
                to_json(self.collection::<Post>())
            }
            (Method::Get, Target::Filtered(Resource::Users, filters)) => {
                to_json(self.store.table::<User>().filter(&filters))
            }
            (Method::Get, Target::Filtered(Resource::Posts, filters)) => {
                to_json(self.store.table::<Post>().filter(&filters))
            }
            (Method::Get, Target::Item(Resource::Users, id)) => {
                to_json(self.get_by_id::<User>(id)?)
            }
            (Method::Get, Target::Item(Resource::Posts, id)) => {
                to_json(self.get_by_id::<Post>(id)?)
            }
            (Method::Post, Target::Collection(Resource::Posts)) => {
                let body = request
                    .body
                    .clone()
                    .ok_or_else(|| ApiError::validation("request body is required"))?;
                let new: NewPost = serde_json::from_value(body)
                    .map_err(|e| ApiError::validation(e.to_string()))?;
                to_json(self.create_post(new)?)
            }
            (Method::Delete, Target::Item(Resource::Posts, id)) => {
                self.delete::<Post>(id)?;
                Ok(Value::Object(Map::new()))
            }
            _ => Err(ApiError::not_found(format!("Cannot {request}"))),
        }
    }
}

fn not_found<T: Record>() -> ApiError {
    ApiError::not_found(format!("{} not found", T::RESOURCE.label()))
}

fn to_json(value: impl Serialize) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::network(format!("malformed response: {e}")))
}
