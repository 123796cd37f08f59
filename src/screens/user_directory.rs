use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use tracing::debug;

use crate::{Client, Id, Status, Tag, TagKind, User, utils::Latest};

/// User list with a detail pane.
///
/// Selecting a user while an earlier selection is still loading discards the earlier result.
#[derive(Clone)]
pub struct UserDirectory(Rc<UserDirectoryData>);

struct UserDirectoryData {
    client: Client,
    users: RefCell<Status<Rc<Vec<User>>>>,
    selected: RefCell<Status<User>>,
    latest: Latest,
    discarded: Cell<usize>,
}

impl UserDirectory {
    pub fn new(client: Client) -> Self {
        Self(Rc::new(UserDirectoryData {
            client,
            users: RefCell::new(Status::Idle),
            selected: RefCell::new(Status::Idle),
            latest: Latest::new(),
            discarded: Cell::new(0),
        }))
    }

    pub fn users(&self) -> Status<Rc<Vec<User>>> {
        self.0.users.borrow().clone()
    }
    pub fn selected(&self) -> Status<User> {
        self.0.selected.borrow().clone()
    }
    /// Number of selection results dropped because a newer selection was made.
    pub fn discarded(&self) -> usize {
        self.0.discarded.get()
    }

    pub async fn load(&self) {
        *self.0.users.borrow_mut() = Status::Loading;
        let result = self.0.client.users().await;
        *self.0.users.borrow_mut() = result.into();
    }

    /// Drops the cached list and loads it again.
    pub async fn refresh(&self) {
        self.0.client.cache().invalidate(&[Tag::all(TagKind::User)]);
        self.load().await;
    }

    /// Loads the detail of `id`. Returns `false` if the result arrived after a newer selection.
    pub async fn select(&self, id: Id) -> bool {
        let ticket = self.0.latest.issue();
        *self.0.selected.borrow_mut() = Status::Loading;
        let result = self.0.client.user(id).await;
        if !self.0.latest.is_current(ticket) {
            debug!(id, "discarding stale selection");
            self.0.discarded.set(self.0.discarded.get() + 1);
            return false;
        }
        *self.0.selected.borrow_mut() = result.into();
        true
    }

    pub fn clear_selection(&self) {
        self.0.latest.cancel();
        *self.0.selected.borrow_mut() = Status::Idle;
    }
}
