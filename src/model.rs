use chrono::{DateTime, Utc};
use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::ApiError;

pub type Id = u64;

/// Collection names of the mock route surface.
#[derive(Debug, Display, FromStr, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Users,
    Posts,
}

impl Resource {
    /// Singular label used in messages such as `"User not found"`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Users => "User",
            Self::Posts => "Post",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Id,
    pub user_id: Id,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload of `POST /posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub user_id: Id,
}

impl NewPost {
    pub fn new(title: impl Into<String>, body: impl Into<String>, user_id: Id) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            user_id,
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("title is required"));
        }
        if self.body.trim().is_empty() {
            return Err(ApiError::validation("body is required"));
        }
        Ok(())
    }

    pub(crate) fn into_post(self, id: Id, created_at: DateTime<Utc>) -> Post {
        Post {
            id,
            user_id: self.user_id,
            title: self.title,
            body: self.body,
            created_at: Some(created_at),
        }
    }
}
