use std::{cell::RefCell, rc::Rc};

use tracing::debug;

use crate::{ApiError, Client, Id, NewPost, Post, Status, utils::Latest};

/// Post list with create and delete actions.
///
/// A successful write invalidates the list and the board loads it again.
/// Only the most recently started refresh updates the list.
#[derive(Clone)]
pub struct PostBoard(Rc<PostBoardData>);

struct PostBoardData {
    client: Client,
    posts: RefCell<Status<Rc<Vec<Post>>>>,
    write_error: RefCell<Option<String>>,
    latest: Latest,
}

impl PostBoard {
    pub fn new(client: Client) -> Self {
        Self(Rc::new(PostBoardData {
            client,
            posts: RefCell::new(Status::Idle),
            write_error: RefCell::new(None),
            latest: Latest::new(),
        }))
    }

    pub fn posts(&self) -> Status<Rc<Vec<Post>>> {
        self.0.posts.borrow().clone()
    }
    /// Message of the last failed create or delete, cleared by the next write.
    pub fn write_error(&self) -> Option<String> {
        self.0.write_error.borrow().clone()
    }

    /// Returns `false` if the result was dropped because a newer refresh started meanwhile.
    pub async fn refresh(&self) -> bool {
        let ticket = self.0.latest.issue();
        *self.0.posts.borrow_mut() = Status::Loading;
        let result = self.0.client.posts().await;
        if !self.0.latest.is_current(ticket) {
            debug!("discarding stale post list");
            return false;
        }
        *self.0.posts.borrow_mut() = result.into();
        true
    }

    pub async fn create(&self, new: NewPost) -> Result<Post, ApiError> {
        let result = self.0.client.create_post(new).await;
        self.after_write(&result).await;
        result
    }

    pub async fn delete(&self, id: Id) -> Result<(), ApiError> {
        let result = self.0.client.delete_post(id).await;
        self.after_write(&result).await;
        result
    }

    async fn after_write<T>(&self, result: &Result<T, ApiError>) {
        match result {
            Ok(_) => {
                *self.0.write_error.borrow_mut() = None;
                self.refresh().await;
            }
            Err(e) => *self.0.write_error.borrow_mut() = Some(e.to_string()),
        }
    }
}
