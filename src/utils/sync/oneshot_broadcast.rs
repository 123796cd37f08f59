use std::{
    cell::RefCell,
    future::poll_fn,
    mem::take,
    rc::Rc,
    task::{Poll, Waker},
};

use derive_ex::Ex;
use slabmap::SlabMap;

struct OneshotBroadcast<T> {
    value: Option<T>,
    closed: bool,
    wakers: SlabMap<Waker>,
}

impl<T> OneshotBroadcast<T> {
    fn wake_all(&mut self) {
        for (_, waker) in take(&mut self.wakers) {
            waker.wake();
        }
    }
}

/// Creates a channel whose single value is delivered to every receiver.
pub fn oneshot_broadcast<T>() -> (Sender<T>, Receiver<T>) {
    let data = Rc::new(RefCell::new(OneshotBroadcast {
        value: None,
        closed: false,
        wakers: SlabMap::new(),
    }));
    (Sender(data.clone()), Receiver(data))
}

/// Sending half. Dropping it without sending closes the channel.
pub struct Sender<T>(Rc<RefCell<OneshotBroadcast<T>>>);

impl<T> Sender<T> {
    pub fn send(self, value: T) {
        let mut data = self.0.borrow_mut();
        data.value = Some(value);
        data.wake_all();
    }
}
impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        let mut data = self.0.borrow_mut();
        data.closed = true;
        data.wake_all();
    }
}

#[derive(Ex)]
#[derive_ex(Clone(bound()))]
pub struct Receiver<T>(Rc<RefCell<OneshotBroadcast<T>>>);

impl<T: Clone> Receiver<T> {
    /// Waits for the value.
    ///
    /// Returns `None` if the sender was dropped without sending.
    pub async fn recv(&self) -> Option<T> {
        let mut key = WakerKeyGuard::new(self);
        poll_fn(|cx| {
            let mut d = self.0.borrow_mut();
            if let Some(value) = &d.value {
                Poll::Ready(Some(value.clone()))
            } else if d.closed {
                Poll::Ready(None)
            } else {
                if let Some(key) = key.key
                    && let Some(waker) = d.wakers.get_mut(key)
                {
                    waker.clone_from(cx.waker());
                } else {
                    key.key = Some(d.wakers.insert(cx.waker().clone()));
                }
                Poll::Pending
            }
        })
        .await
    }

    pub fn try_recv(&self) -> Option<T> {
        self.0.borrow().value.clone()
    }

    pub fn is_closed(&self) -> bool {
        let d = self.0.borrow();
        d.value.is_none() && d.closed
    }
}

struct WakerKeyGuard<'a, T> {
    receiver: &'a Receiver<T>,
    key: Option<usize>,
}
impl<'a, T> WakerKeyGuard<'a, T> {
    fn new(receiver: &'a Receiver<T>) -> Self {
        Self {
            receiver,
            key: None,
        }
    }
}
impl<T> Drop for WakerKeyGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(key) = self.key {
            self.receiver.0.borrow_mut().wakers.remove(key);
        }
    }
}
