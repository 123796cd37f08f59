use std::{cell::RefCell, rc::Rc};

use chrono::{DateTime, Duration, Utc};

use crate::{FixtureConfig, Id, Post, User};

mod random;

pub use random::*;

#[cfg(test)]
mod tests;

/// Probability used by [`Fixtures::simulate_default_error`].
pub const DEFAULT_ERROR_RATE: f64 = 0.1;

const NAMES: &[&str] = &[
    "Leanne Graham",
    "Ervin Howell",
    "Clementine Bauch",
    "Patricia Lebsack",
    "Chelsey Dietrich",
    "Dennis Schulist",
    "Kurtis Weissnat",
    "Nicholas Runolfsdottir",
    "Glenna Reichert",
    "Clementina DuBuque",
];
const DOMAINS: &[&str] = &["april.biz", "melissa.tv", "yesenia.net", "kory.org", "annie.ca"];
const COMPANIES: &[&str] = &[
    "Romaguera-Crona",
    "Deckow-Crist",
    "Robel-Corkery",
    "Keebler LLC",
    "Considine-Lockman",
];

const TITLES: &[&str] = &[
    "Getting started with cached queries",
    "Why tags beat manual refetching",
    "Optimistic updates without tears",
    "Sequencing dependent requests",
    "Handling flaky networks gracefully",
];
const BODIES: &[&str] = &[
    "A read is tagged with what it produced so a later write knows what to refresh.",
    "Deduplicating in-flight requests keeps the mock backend from being hammered.",
    "Create and delete flows invalidate the collection and the list refreshes itself.",
    "The second request waits for the first one and never runs if it failed.",
    "Synthetic failures are injected at a configurable rate to exercise error states.",
];

/// Number of posts generated per user when a read falls back to fixtures.
pub const FALLBACK_POSTS_PER_USER: usize = 3;

/// Generator for synthetic users, posts and identifiers.
///
/// Cloning is cheap; clones share the same random source and clock.
#[derive(Clone)]
pub struct Fixtures(Rc<FixturesData>);

struct FixturesData {
    random: RefCell<Box<dyn RandomSource>>,
    clock: Box<dyn Clock>,
}

impl Fixtures {
    pub fn new(random: impl RandomSource + 'static, clock: impl Clock + 'static) -> Self {
        Self(Rc::new(FixturesData {
            random: RefCell::new(Box::new(random)),
            clock: Box::new(clock),
        }))
    }
    pub fn from_entropy() -> Self {
        Self::new(StdRandom::from_entropy(), SystemClock)
    }
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRandom::seeded(seed), SystemClock)
    }
    pub fn from_config(config: &FixtureConfig) -> Self {
        match config.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.0.clock.now()
    }
    fn below(&self, bound: u64) -> u64 {
        self.0.random.borrow_mut().below(bound)
    }

    /// Builds a user whose `id`, `name` and `email` depend only on `id`.
    ///
    /// `post_count` and `created_at` are drawn from the random source and differ between calls.
    pub fn generate_user(&self, id: Id) -> User {
        let name = pick(NAMES, id);
        let domain = pick(DOMAINS, id);
        let email = format!("{}@{domain}", name.replace(' ', ".").to_lowercase());
        let days_ago = self.below(365) as i64;
        User {
            id,
            name: name.to_string(),
            email,
            phone: Some(format!("1-770-736-{:04}", 8031 + id % 1000)),
            website: Some(domain.to_string()),
            company_name: Some(pick(COMPANIES, id).to_string()),
            post_count: Some(self.below(50) as u32),
            created_at: Some(self.now() - Duration::days(days_ago)),
        }
    }

    pub fn generate_post(&self, user_id: Id, post_id: Id) -> Post {
        Post {
            id: post_id,
            user_id,
            title: pick(TITLES, post_id).to_string(),
            body: pick(BODIES, post_id).to_string(),
            created_at: Some(self.now()),
        }
    }

    /// Builds `count` posts for `user_id` with ids `user_id * 100 + 1 ..`.
    pub fn generate_posts(&self, user_id: Id, count: usize) -> Vec<Post> {
        (1..=count as Id)
            .map(|i| self.generate_post(user_id, user_id.saturating_mul(100).saturating_add(i)))
            .collect()
    }

    /// Current time in milliseconds plus a random offset in `[0, 1000)`.
    ///
    /// Not strictly monotonic; two calls within the same millisecond may collide.
    pub fn generate_id(&self) -> Id {
        let millis = self.now().timestamp_millis().max(0) as u64;
        millis + self.below(1000)
    }

    /// Returns `true` with probability `error_rate`, clamped into `[0, 1]`.
    pub fn simulate_error(&self, error_rate: f64) -> bool {
        let rate = if error_rate.is_nan() {
            0.0
        } else {
            error_rate.clamp(0.0, 1.0)
        };
        if rate <= 0.0 {
            return false;
        }
        self.0.random.borrow_mut().next_f64() < rate
    }

    pub fn simulate_default_error(&self) -> bool {
        self.simulate_error(DEFAULT_ERROR_RATE)
    }
}

fn pick(pool: &'static [&'static str], id: Id) -> &'static str {
    pool[(id % pool.len() as Id) as usize]
}
