use std::fmt;

use parse_display::{Display, FromStr};

use crate::Id;

#[derive(Debug, Display, FromStr, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    User,
    Post,
}

/// Label attached to a cached result.
///
/// A tag without id stands for every record of its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: TagKind,
    pub id: Option<Id>,
}

impl Tag {
    pub const fn all(kind: TagKind) -> Self {
        Self { kind, id: None }
    }
    pub const fn id(kind: TagKind, id: Id) -> Self {
        Self { kind, id: Some(id) }
    }

    /// Same kind, and either side is the whole kind or both name the same record.
    pub fn overlaps(&self, other: &Tag) -> bool {
        self.kind == other.kind
            && match (self.id, other.id) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}:{id}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}
