use std::{
    any::Any,
    cell::RefCell,
    collections::HashMap,
    fmt,
    future::Future,
    mem::take,
    rc::Rc,
    time::{Duration, Instant},
};

use tracing::debug;

use crate::{
    CacheConfig,
    utils::sync::{Receiver, Sender, oneshot_broadcast},
};

mod tag;

pub use tag::*;


/// Identifies a query: an endpoint name plus its formatted parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    endpoint: &'static str,
    params: Option<String>,
}

impl QueryKey {
    pub fn new(endpoint: &'static str, params: impl fmt::Display) -> Self {
        Self {
            endpoint,
            params: Some(params.to_string()),
        }
    }
    pub fn unit(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            params: None,
        }
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.params {
            Some(params) => write!(f, "{}({params})", self.endpoint),
            None => write!(f, "{}", self.endpoint),
        }
    }
}

enum Entry {
    Pending {
        rx: Box<dyn Any>,
        tags: Vec<Tag>,
        epoch: u64,
        invalidated: bool,
    },
    Ready {
        value: Box<dyn Any>,
        tags: Vec<Tag>,
        fetched_at: Instant,
    },
}

impl Entry {
    fn tags(&self) -> &[Tag] {
        match self {
            Entry::Pending { tags, .. } | Entry::Ready { tags, .. } => tags,
        }
    }
    fn is_fresh(&self, retention: Duration) -> bool {
        match self {
            Entry::Ready { fetched_at, .. } => fetched_at.elapsed() < retention,
            Entry::Pending { .. } => false,
        }
    }
}

struct CacheData {
    entries: HashMap<QueryKey, Entry>,
    retention: Duration,
    next_epoch: u64,
}

enum Begin<T, E> {
    Cached(T),
    Join(Receiver<Result<T, E>>),
    Lead(Sender<Result<T, E>>, u64),
}

/// Keyed results with tag-based invalidation and in-flight deduplication.
///
/// Cloning is cheap; clones share the same entries.
#[derive(Clone)]
pub struct QueryCache(Rc<RefCell<CacheData>>);

impl QueryCache {
    /// A `retention` of zero disables caching; concurrent requests are still deduplicated.
    pub fn new(retention: Duration) -> Self {
        Self(Rc::new(RefCell::new(CacheData {
            entries: HashMap::new(),
            retention,
            next_epoch: 0,
        })))
    }
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.retention())
    }

    pub fn retention(&self) -> Duration {
        self.0.borrow().retention
    }

    /// Returns the result for `key`, calling `fetch` only when needed.
    ///
    /// A fresh result is returned as-is. While another caller is fetching the same key,
    /// this call waits for that result instead of starting a second fetch, unless that fetch
    /// was invalidated after it started.
    /// Successful results are kept for the retention window and tagged with `tags`;
    /// errors are handed to every waiter but never kept.
    pub async fn query<T, E, Fut>(
        &self,
        key: QueryKey,
        tags: &[Tag],
        fetch: impl FnOnce() -> Fut,
    ) -> Result<T, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        Fut: Future<Output = Result<T, E>>,
    {
        loop {
            let rx = match self.begin::<T, E>(&key, tags) {
                Begin::Cached(value) => {
                    debug!(%key, "cache hit");
                    return Ok(value);
                }
                Begin::Join(rx) => rx,
                Begin::Lead(tx, epoch) => {
                    debug!(%key, "cache miss");
                    return self.lead(&key, epoch, tx, fetch).await;
                }
            };
            debug!(%key, "joining in-flight request");
            if let Some(result) = rx.recv().await {
                return result;
            }
            debug!(%key, "in-flight request was dropped");
        }
    }

    fn begin<T, E>(&self, key: &QueryKey, tags: &[Tag]) -> Begin<T, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        let mut data = self.0.borrow_mut();
        let retention = data.retention;
        match data.entries.get(key) {
            Some(Entry::Ready {
                value, fetched_at, ..
            }) if fetched_at.elapsed() < retention => {
                if let Some(value) = value.downcast_ref::<T>() {
                    return Begin::Cached(value.clone());
                }
            }
            Some(Entry::Pending {
                rx,
                invalidated: false,
                ..
            }) => {
                if let Some(rx) = rx.downcast_ref::<Receiver<Result<T, E>>>() {
                    return Begin::Join(rx.clone());
                }
            }
            _ => {}
        }
        let (tx, rx) = oneshot_broadcast::<Result<T, E>>();
        let epoch = data.next_epoch;
        data.next_epoch += 1;
        data.entries.insert(
            key.clone(),
            Entry::Pending {
                rx: Box::new(rx),
                tags: tags.to_vec(),
                epoch,
                invalidated: false,
            },
        );
        Begin::Lead(tx, epoch)
    }

    async fn lead<T, E, Fut>(
        &self,
        key: &QueryKey,
        epoch: u64,
        tx: Sender<Result<T, E>>,
        fetch: impl FnOnce() -> Fut,
    ) -> Result<T, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut guard = PendingGuard {
            cache: self,
            key,
            epoch,
            armed: true,
        };
        let result = fetch().await;
        guard.armed = false;
        self.settle(key, epoch, &result);
        tx.send(result.clone());
        result
    }

    /// Replaces our pending entry with the result, or drops it.
    fn settle<T: Clone + 'static, E>(&self, key: &QueryKey, epoch: u64, result: &Result<T, E>) {
        let mut data = self.0.borrow_mut();
        let data = &mut *data;
        let Some(entry) = data.entries.get_mut(key) else {
            return;
        };
        let Entry::Pending {
            epoch: current,
            invalidated,
            tags,
            ..
        } = entry
        else {
            return;
        };
        if *current != epoch {
            return;
        }
        if let Ok(value) = result
            && !*invalidated
            && !data.retention.is_zero()
        {
            let tags = take(tags);
            *entry = Entry::Ready {
                value: Box::new(value.clone()),
                tags,
                fetched_at: Instant::now(),
            };
        } else {
            data.entries.remove(key);
        }
    }

    fn abandon(&self, key: &QueryKey, epoch: u64) {
        let mut data = self.0.borrow_mut();
        if let Some(Entry::Pending { epoch: current, .. }) = data.entries.get(key)
            && *current == epoch
        {
            debug!(%key, "request dropped before completion");
            data.entries.remove(key);
        }
    }

    /// Drops every result tagged with something overlapping `tags`.
    ///
    /// Requests still in flight deliver their result to the waiting callers but do not keep it.
    /// Returns the number of affected entries.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        let mut count = 0;
        self.0.borrow_mut().entries.retain(|_, entry| {
            if !entry.tags().iter().any(|a| tags.iter().any(|b| a.overlaps(b))) {
                return true;
            }
            count += 1;
            match entry {
                Entry::Ready { .. } => false,
                Entry::Pending { invalidated, .. } => {
                    *invalidated = true;
                    true
                }
            }
        });
        debug!(tags = ?tags, count, "invalidated");
        count
    }

    /// Awaits a write and invalidates `invalidates` when it succeeded.
    pub async fn mutate<T, E>(
        &self,
        invalidates: &[Tag],
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, E> {
        let result = fut.await;
        if result.is_ok() {
            self.invalidate(invalidates);
        }
        result
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.0.borrow().entries.contains_key(key)
    }
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        let data = self.0.borrow();
        data.entries
            .get(key)
            .is_some_and(|entry| entry.is_fresh(data.retention))
    }
    pub fn is_pending(&self, key: &QueryKey) -> bool {
        matches!(self.0.borrow().entries.get(key), Some(Entry::Pending { .. }))
    }
    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets `key`. A request in flight for it still completes but its result is not kept.
    pub fn remove(&self, key: &QueryKey) -> bool {
        self.0.borrow_mut().entries.remove(key).is_some()
    }
    pub fn clear(&self) {
        self.0.borrow_mut().entries.clear();
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

struct PendingGuard<'a> {
    cache: &'a QueryCache,
    key: &'a QueryKey,
    epoch: u64,
    armed: bool,
}
impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.abandon(self.key, self.epoch);
        }
    }
}
