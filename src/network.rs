use std::{cell::RefCell, collections::HashMap, rc::Rc};

use parse_display::Display;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    ApiError, Config, FALLBACK_POSTS_PER_USER, Fixtures, Id, NetworkConfig, NewPost, Post,
    RecordStore, Registry, Request, User,
    utils::timer::{sleep, with_timeout},
};


/// Operations counted by [`MockApi::call_count`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display(style = "snake_case")]
pub enum Endpoint {
    Users,
    User,
    Posts,
    UserPosts,
    CreatePost,
    DeletePost,
    /// Requests issued through [`MockApi::send`].
    Raw,
}

/// Simulated network in front of a [`Registry`].
///
/// Every operation suspends for the configured delay, may fail with an injected
/// [`ApiError::SimulatedNetworkFailure`] and only then reaches the registry.
/// Cloning is cheap; clones share the registry and the call counters.
#[derive(Clone)]
pub struct MockApi(Rc<MockApiData>);

struct MockApiData {
    registry: Rc<RefCell<Registry>>,
    fixtures: Fixtures,
    config: NetworkConfig,
    calls: RefCell<HashMap<Endpoint, usize>>,
}

impl MockApi {
    pub fn new(registry: Rc<RefCell<Registry>>, config: NetworkConfig) -> Self {
        let fixtures = registry.borrow().fixtures().clone();
        Self(Rc::new(MockApiData {
            registry,
            fixtures,
            config,
            calls: RefCell::new(HashMap::new()),
        }))
    }

    pub fn from_config(config: &Config) -> Result<Self, serde_json::Error> {
        let store = if config.fixtures.seed_store {
            RecordStore::seeded()?
        } else {
            RecordStore::new()
        };
        let registry = Registry::new(store, Fixtures::from_config(&config.fixtures));
        Ok(Self::new(
            Rc::new(RefCell::new(registry)),
            config.network.clone(),
        ))
    }

    pub fn registry(&self) -> &Rc<RefCell<Registry>> {
        &self.0.registry
    }
    pub fn config(&self) -> &NetworkConfig {
        &self.0.config
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.0.calls.borrow().get(&endpoint).copied().unwrap_or(0)
    }
    pub fn total_calls(&self) -> usize {
        self.0.calls.borrow().values().sum()
    }
    pub fn reset_calls(&self) {
        self.0.calls.borrow_mut().clear();
    }

    /// Sends an arbitrary request through the simulated network.
    pub async fn send(&self, request: Request) -> Result<Value, ApiError> {
        self.call(Endpoint::Raw, request, "Request failed").await
    }

    pub async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        let result = self
            .call(Endpoint::Users, Request::get("/users"), "Failed to fetch users")
            .await;
        self.or_fallback(Endpoint::Users, result, |fixtures| {
            self.user_ids().map(|id| fixtures.generate_user(id)).collect()
        })
    }

    /// Fetches a single user.
    ///
    /// Ids outside `1..=max_user_id` always fail with `"User not found"`, fallback or not.
    pub async fn fetch_user(&self, id: Id) -> Result<User, ApiError> {
        let endpoint = Endpoint::User;
        let request = self.start(endpoint, Request::get(format!("/users/{id}")));
        let delayed = self.delay(endpoint).await;
        if !self.user_ids().contains(&id) {
            delayed?;
            return Err(ApiError::network("User not found"));
        }
        let result =
            delayed.and_then(|()| self.respond(endpoint, &request, "Failed to fetch user"));
        self.or_fallback(endpoint, result, |fixtures| {
            let user = fixtures.generate_user(id);
            self.0.registry.borrow_mut().insert(user.clone());
            user
        })
    }

    pub async fn fetch_posts(&self) -> Result<Vec<Post>, ApiError> {
        let result = self
            .call(Endpoint::Posts, Request::get("/posts"), "Failed to fetch posts")
            .await;
        self.or_fallback(Endpoint::Posts, result, |fixtures| {
            self.user_ids()
                .flat_map(|id| fixtures.generate_posts(id, FALLBACK_POSTS_PER_USER))
                .collect()
        })
    }

    pub async fn fetch_user_posts(&self, user_id: Id) -> Result<Vec<Post>, ApiError> {
        let result = self
            .call(
                Endpoint::UserPosts,
                Request::get(format!("/posts?userId={user_id}")),
                "Failed to fetch posts",
            )
            .await;
        self.or_fallback(Endpoint::UserPosts, result, |fixtures| {
            fixtures.generate_posts(user_id, FALLBACK_POSTS_PER_USER)
        })
    }

    pub async fn create_post(&self, new: NewPost) -> Result<Post, ApiError> {
        let body = serde_json::to_value(&new).map_err(|e| ApiError::validation(e.to_string()))?;
        self.call(
            Endpoint::CreatePost,
            Request::post("/posts", body),
            "Failed to create post",
        )
        .await
    }

    pub async fn delete_post(&self, id: Id) -> Result<(), ApiError> {
        let _: Value = self
            .call(
                Endpoint::DeletePost,
                Request::delete(format!("/posts/{id}")),
                "Failed to delete post",
            )
            .await?;
        Ok(())
    }

    fn user_ids(&self) -> std::ops::RangeInclusive<Id> {
        1..=self.0.config.max_user_id
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: Request,
        failure: &str,
    ) -> Result<T, ApiError> {
        let request = self.start(endpoint, request);
        self.delay(endpoint).await?;
        self.respond(endpoint, &request, failure)
    }

    fn start(&self, endpoint: Endpoint, request: Request) -> Request {
        *self.0.calls.borrow_mut().entry(endpoint).or_default() += 1;
        let base_url = self.0.config.base_url.trim_end_matches('/');
        let request = request.relative_to(base_url);
        debug!(
            %endpoint,
            method = %request.method,
            base_url,
            path = %request.path,
            "request"
        );
        request
    }

    async fn delay(&self, endpoint: Endpoint) -> Result<(), ApiError> {
        let delay = self.0.config.delay_for(endpoint);
        match self.0.config.timeout() {
            Some(timeout) => with_timeout(sleep(delay), timeout).await.map_err(|_| {
                warn!(%endpoint, ?timeout, "request timed out");
                ApiError::network("Request timed out")
            }),
            None => {
                sleep(delay).await;
                Ok(())
            }
        }
    }

    fn respond<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: &Request,
        failure: &str,
    ) -> Result<T, ApiError> {
        if self.0.fixtures.simulate_error(self.0.config.error_rate) {
            warn!(%endpoint, "injected network failure");
            return Err(ApiError::network(failure));
        }
        let value = self.0.registry.borrow_mut().dispatch(request)?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::network(format!("malformed response: {e}")))
    }

    fn or_fallback<T>(
        &self,
        endpoint: Endpoint,
        result: Result<T, ApiError>,
        generate: impl FnOnce(&Fixtures) -> T,
    ) -> Result<T, ApiError> {
        match result {
            Err(e) if self.0.config.fallback => {
                warn!(%endpoint, error = %e, "read failed, serving generated fixtures");
                Ok(generate(&self.0.fixtures))
            }
            result => result,
        }
    }
}
