use std::rc::Rc;

use crate::{
    ApiError, Config, Id, MockApi, NewPost, Post, QueryCache, QueryKey, Tag, TagKind, User,
};

#[cfg(test)]
mod tests;

const USERS: &str = "users";
const USER: &str = "user";
const POSTS: &str = "posts";
const USER_POSTS: &str = "user_posts";

/// Cached reads and invalidating writes over a [`MockApi`].
///
/// | operation        | provides / invalidates |
/// |------------------|------------------------|
/// | `users`          | provides `User`        |
/// | `user(id)`       | provides `User:id`     |
/// | `posts`          | provides `Post`        |
/// | `user_posts(id)` | provides `Post`, `User:id` |
/// | `create_post`    | invalidates `Post`     |
/// | `delete_post(id)`| invalidates `Post:id`  |
#[derive(Clone)]
pub struct Client {
    api: MockApi,
    cache: QueryCache,
}

impl Client {
    pub fn new(api: MockApi, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub fn from_config(config: &Config) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            MockApi::from_config(config)?,
            QueryCache::from_config(&config.cache),
        ))
    }

    pub fn api(&self) -> &MockApi {
        &self.api
    }
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn users(&self) -> Result<Rc<Vec<User>>, ApiError> {
        self.cache
            .query(
                QueryKey::unit(USERS),
                &[Tag::all(TagKind::User)],
                || async { self.api.fetch_users().await.map(Rc::new) },
            )
            .await
    }

    pub async fn user(&self, id: Id) -> Result<User, ApiError> {
        self.cache
            .query(
                QueryKey::new(USER, id),
                &[Tag::id(TagKind::User, id)],
                || self.api.fetch_user(id),
            )
            .await
    }

    pub async fn posts(&self) -> Result<Rc<Vec<Post>>, ApiError> {
        self.cache
            .query(
                QueryKey::unit(POSTS),
                &[Tag::all(TagKind::Post)],
                || async { self.api.fetch_posts().await.map(Rc::new) },
            )
            .await
    }

    pub async fn user_posts(&self, user_id: Id) -> Result<Rc<Vec<Post>>, ApiError> {
        self.cache
            .query(
                QueryKey::new(USER_POSTS, user_id),
                &[Tag::all(TagKind::Post), Tag::id(TagKind::User, user_id)],
                || async { self.api.fetch_user_posts(user_id).await.map(Rc::new) },
            )
            .await
    }

    pub async fn create_post(&self, new: NewPost) -> Result<Post, ApiError> {
        self.cache
            .mutate(&[Tag::all(TagKind::Post)], self.api.create_post(new))
            .await
    }

    pub async fn delete_post(&self, id: Id) -> Result<(), ApiError> {
        self.cache
            .mutate(&[Tag::id(TagKind::Post, id)], self.api.delete_post(id))
            .await
    }
}
