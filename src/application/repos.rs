//! Store ports used by the use-cases.
//!
//! The relational store is authoritative for every entity and edge. Each
//! method is a single logical statement; callers never hold a transaction
//! across calls.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::PageRequest;
use crate::domain::entities::{Blog, BlogId, User, UserId, UserStats};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    /// Insert a user and return it with the store-assigned id.
    async fn create_user(&self, user: &User) -> Result<User, RepoError>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepoError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Persist the mutable profile fields and `updated_at`.
    async fn update_user(&self, user: &User) -> Result<(), RepoError>;

    /// Idempotent: an existing edge is left untouched.
    async fn create_follow(&self, follower: UserId, following: UserId) -> Result<(), RepoError>;

    /// No-op when the edge is absent.
    async fn delete_follow(&self, follower: UserId, following: UserId) -> Result<(), RepoError>;

    async fn is_following(&self, follower: UserId, following: UserId) -> Result<bool, RepoError>;

    /// Users following `user_id`, newest edge first.
    async fn list_followers(&self, user_id: UserId, page: PageRequest)
    -> Result<Vec<User>, RepoError>;

    /// Users `user_id` follows, newest edge first.
    async fn list_following(&self, user_id: UserId, page: PageRequest)
    -> Result<Vec<User>, RepoError>;

    async fn user_stats(&self, user_id: UserId) -> Result<UserStats, RepoError>;
}

#[async_trait]
pub trait BlogsRepo: Send + Sync {
    async fn create_blog(&self, blog: &Blog) -> Result<Blog, RepoError>;

    /// Includes the author snapshot and the current like count.
    async fn find_blog_by_id(&self, id: BlogId) -> Result<Option<Blog>, RepoError>;

    /// Newest first, ties broken by id.
    async fn list_blogs(&self, page: PageRequest) -> Result<Vec<Blog>, RepoError>;

    async fn list_blogs_by_author(
        &self,
        author_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<Blog>, RepoError>;

    /// Update content matched on `(id, author_id)`.
    async fn update_blog(&self, blog: &Blog) -> Result<(), RepoError>;

    /// Delete matched on `(id, author_id)`; returns the affected row count.
    async fn delete_blog(&self, id: BlogId, author_id: UserId) -> Result<u64, RepoError>;

    async fn create_like(&self, blog_id: BlogId, user_id: UserId) -> Result<(), RepoError>;

    async fn delete_like(&self, blog_id: BlogId, user_id: UserId) -> Result<(), RepoError>;

    async fn is_liked(&self, blog_id: BlogId, user_id: UserId) -> Result<bool, RepoError>;

    /// Users who liked the blog, newest like first.
    async fn list_likers(&self, blog_id: BlogId, page: PageRequest)
    -> Result<Vec<User>, RepoError>;
}
