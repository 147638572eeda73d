//! Cache key definitions.

use std::fmt;

use crate::domain::entities::{BlogId, UserId};

/// Prefix shared by every blog-list entry. Blog create, update and delete
/// drop the whole namespace.
pub const BLOG_LIST_NAMESPACE: &str = "blogs:";

/// Key of a single cached entity snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `user:<id>`
    User(UserId),
    /// `blog:<id>`
    Blog(BlogId),
}

impl CacheKey {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Blog(_) => "blog",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Blog(id) => write!(f, "blog:{id}"),
        }
    }
}
