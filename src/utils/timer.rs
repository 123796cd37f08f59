//! Non-blocking delays driven by a single background wake-up thread.
//!
//! Futures returned by [`sleep`] park their waker in a shared deadline queue; the driver thread
//! wakes them when the deadline passes. The awaiting task never blocks its executor.

use std::{
    collections::BTreeMap,
    future::Future,
    pin::{Pin, pin},
    sync::{Condvar, LazyLock, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll, Waker},
    time::{Duration, Instant},
};

use futures::future::{Either, select};
use parse_display::Display;
use slabmap::SlabMap;

static DRIVER: LazyLock<Driver> = LazyLock::new(|| Driver {
    queue: Mutex::new(DeadlineQueue::new()),
    condvar: Condvar::new(),
});

struct Driver {
    queue: Mutex<DeadlineQueue>,
    condvar: Condvar,
}
impl Driver {
    fn lock(&self) -> MutexGuard<'_, DeadlineQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run(&self) {
        let mut due = Vec::new();
        let mut queue = self.lock();
        loop {
            let now = Instant::now();
            queue.take_due(now, &mut due);
            if !due.is_empty() {
                drop(queue);
                for waker in due.drain(..) {
                    waker.wake();
                }
                queue = self.lock();
                continue;
            }
            queue = match queue.next_deadline() {
                Some(deadline) => {
                    let wait = deadline.saturating_duration_since(now);
                    self.condvar
                        .wait_timeout(queue, wait)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .condvar
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    deadline: Instant,
    seq: u64,
}

struct Entry {
    key: Key,
    waker: Waker,
}

struct DeadlineQueue {
    next_seq: u64,
    order: BTreeMap<Key, usize>,
    entries: SlabMap<Option<Entry>>,
    driver_running: bool,
}

impl DeadlineQueue {
    fn new() -> Self {
        Self {
            next_seq: 0,
            order: BTreeMap::new(),
            entries: SlabMap::new(),
            driver_running: false,
        }
    }

    fn insert(&mut self, deadline: Instant, waker: Waker, condvar: &Condvar) -> usize {
        if !self.driver_running {
            self.driver_running = true;
            std::thread::spawn(|| DRIVER.run());
        }
        let key = Key {
            deadline,
            seq: self.next_seq,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        let is_earliest = self.order.first_key_value().is_none_or(|(first, _)| key < *first);
        let id = self.entries.insert(Some(Entry { key, waker }));
        self.order.insert(key, id);
        if is_earliest {
            condvar.notify_one();
        }
        id
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.order.first_key_value().map(|(key, _)| key.deadline)
    }

    fn take_due(&mut self, now: Instant, due: &mut Vec<Waker>) {
        while let Some(first) = self.order.first_entry()
            && first.key().deadline <= now
        {
            let id = first.remove();
            if let Some(slot) = self.entries.get_mut(id)
                && let Some(entry) = slot.take()
            {
                due.push(entry.waker);
            }
        }
    }

    /// `Ready` once the entry has fired; the fired entry is released.
    fn poll_entry(&mut self, id: usize, cx: &Context) -> Poll<()> {
        match self.entries.get_mut(id) {
            Some(Some(entry)) => {
                if !entry.waker.will_wake(cx.waker()) {
                    entry.waker = cx.waker().clone();
                }
                Poll::Pending
            }
            _ => {
                self.entries.remove(id);
                Poll::Ready(())
            }
        }
    }

    fn cancel(&mut self, id: usize) {
        if let Some(Some(entry)) = self.entries.remove(id) {
            self.order.remove(&entry.key);
        }
    }
}

struct Delay {
    deadline: Instant,
    id: Option<usize>,
    fired: bool,
}

impl Future for Delay {
    type Output = ();
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.fired {
            return Poll::Ready(());
        }
        let mut queue = DRIVER.lock();
        match this.id {
            None => {
                this.id = Some(queue.insert(this.deadline, cx.waker().clone(), &DRIVER.condvar));
                Poll::Pending
            }
            Some(id) => {
                let poll = queue.poll_entry(id, cx);
                if poll.is_ready() {
                    this.id = None;
                    this.fired = true;
                }
                poll
            }
        }
    }
}
impl Drop for Delay {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            DRIVER.lock().cancel(id);
        }
    }
}

/// Suspends the current task for `duration`.
///
/// A zero duration completes without suspending.
pub async fn sleep(duration: Duration) {
    sleep_until(Instant::now() + duration).await
}

pub async fn sleep_until(deadline: Instant) {
    if deadline > Instant::now() {
        Delay {
            deadline,
            id: None,
            fired: false,
        }
        .await
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display("timeout")]
pub struct TimeoutError {
    _private: (),
}
impl TimeoutError {
    fn new() -> Self {
        Self { _private: () }
    }
}

impl std::error::Error for TimeoutError {}

/// Runs `fut` and gives up after `duration`, dropping it.
pub async fn with_timeout<T>(
    fut: impl Future<Output = T>,
    duration: Duration,
) -> Result<T, TimeoutError> {
    let fut = pin!(fut);
    let timeout = pin!(sleep(duration));
    match select(fut, timeout).await {
        Either::Left((value, _)) => Ok(value),
        Either::Right(((), _)) => Err(TimeoutError::new()),
    }
}
