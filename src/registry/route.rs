use parse_display::{Display, FromStr};
use serde_json::Value;

use crate::{ApiError, Id, Resource};

#[derive(Debug, Display, FromStr, Clone, Copy, PartialEq, Eq, Hash)]
#[display(style = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// A request against the mock host.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
        }
    }

    /// Drops `base_url` from the front of the path when the request was built from an absolute URL.
    pub fn relative_to(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        if !base.is_empty()
            && let Some(rest) = self.path.strip_prefix(base)
        {
            self.path = if rest.is_empty() {
                "/".to_string()
            } else {
                rest.to_string()
            };
        }
        self
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Parsed form of a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    Collection(Resource),
    Filtered(Resource, Vec<(String, String)>),
    Item(Resource, Id),
}

impl Target {
    pub(crate) fn parse(request: &Request) -> Result<Self, ApiError> {
        let no_route = || ApiError::not_found(format!("Cannot {request}"));
        let (path, query) = match request.path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (request.path.as_str(), None),
        };
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let resource: Resource = segments
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(no_route)?;
        let id = match segments.next() {
            Some(s) => Some(s.parse::<Id>().map_err(|_| no_route())?),
            None => None,
        };
        if segments.next().is_some() {
            return Err(no_route());
        }
        let filters = query.map(parse_query).unwrap_or_default();
        Ok(match (id, filters.is_empty()) {
            (Some(id), _) => Self::Item(resource, id),
            (None, true) => Self::Collection(resource),
            (None, false) => Self::Filtered(resource, filters),
        })
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
