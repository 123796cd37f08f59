use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use futures::future::{join, try_join};
use tracing::debug;

use crate::{
    ApiError, Client, Id, Post, Status, User,
    utils::{Latest, Ticket},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user: User,
    pub posts: Rc<Vec<Post>>,
}

/// A user followed by that user's posts.
///
/// Starting a load supersedes the ones still in flight. Their results are dropped on arrival
/// and the `load*` methods return `None` for them.
#[derive(Clone)]
pub struct ProfileChain(Rc<ProfileChainData>);

struct ProfileChainData {
    client: Client,
    user: RefCell<Status<User>>,
    posts: RefCell<Status<Rc<Vec<Post>>>>,
    latest: Latest,
    discarded: Cell<usize>,
}

impl ProfileChain {
    pub fn new(client: Client) -> Self {
        Self(Rc::new(ProfileChainData {
            client,
            user: RefCell::new(Status::Idle),
            posts: RefCell::new(Status::Idle),
            latest: Latest::new(),
            discarded: Cell::new(0),
        }))
    }

    pub fn user(&self) -> Status<User> {
        self.0.user.borrow().clone()
    }
    pub fn posts(&self) -> Status<Rc<Vec<Post>>> {
        self.0.posts.borrow().clone()
    }
    /// Number of load results dropped because a newer load was started.
    pub fn discarded(&self) -> usize {
        self.0.discarded.get()
    }
    pub fn profile(&self) -> Status<Profile> {
        match (&*self.0.user.borrow(), &*self.0.posts.borrow()) {
            (Status::Ready(user), Status::Ready(posts)) => Status::Ready(Profile {
                user: user.clone(),
                posts: posts.clone(),
            }),
            (Status::Failed(message), _) | (_, Status::Failed(message)) => {
                Status::Failed(message.clone())
            }
            (Status::Idle, Status::Idle) => Status::Idle,
            _ => Status::Loading,
        }
    }

    /// Fetches the user, then the posts. The posts are not requested if the user failed
    /// or a newer load started meanwhile.
    pub async fn load(&self, id: Id) -> Option<Result<Profile, ApiError>> {
        let ticket = self.start();
        let user = self.0.client.user(id).await;
        self.publish(ticket, |d| *d.user.borrow_mut() = user.clone().into())?;
        let user = match user {
            Ok(user) => user,
            Err(e) => {
                *self.0.posts.borrow_mut() = Status::Idle;
                return Some(Err(e));
            }
        };
        let posts = self.0.client.user_posts(id).await;
        self.publish(ticket, |d| *d.posts.borrow_mut() = posts.clone().into())?;
        Some(posts.map(|posts| Profile { user, posts }))
    }

    /// Fetches both at once and fails as soon as either fails.
    pub async fn load_parallel(&self, id: Id) -> Option<Result<Profile, ApiError>> {
        let ticket = self.start();
        let result = try_join(self.0.client.user(id), self.0.client.user_posts(id)).await;
        self.publish(ticket, |d| match &result {
            Ok((user, posts)) => {
                *d.user.borrow_mut() = Status::Ready(user.clone());
                *d.posts.borrow_mut() = Status::Ready(posts.clone());
            }
            Err(e) => {
                *d.user.borrow_mut() = Status::Failed(e.to_string());
                *d.posts.borrow_mut() = Status::Failed(e.to_string());
            }
        })?;
        Some(result.map(|(user, posts)| Profile { user, posts }))
    }

    /// Fetches both at once and keeps each outcome on its own.
    pub async fn load_independent(
        &self,
        id: Id,
    ) -> Option<(Result<User, ApiError>, Result<Rc<Vec<Post>>, ApiError>)> {
        let ticket = self.start();
        let (user, posts) = join(self.0.client.user(id), self.0.client.user_posts(id)).await;
        self.publish(ticket, |d| {
            *d.user.borrow_mut() = user.clone().into();
            *d.posts.borrow_mut() = posts.clone().into();
        })?;
        Some((user, posts))
    }

    fn start(&self) -> Ticket {
        let ticket = self.0.latest.issue();
        *self.0.user.borrow_mut() = Status::Loading;
        *self.0.posts.borrow_mut() = Status::Loading;
        ticket
    }

    fn publish(&self, ticket: Ticket, write: impl FnOnce(&ProfileChainData)) -> Option<()> {
        if !self.0.latest.is_current(ticket) {
            debug!("discarding stale profile");
            self.0.discarded.set(self.0.discarded.get() + 1);
            return None;
        }
        write(&self.0);
        Some(())
    }
}
