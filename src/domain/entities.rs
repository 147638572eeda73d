//! Domain entities mirrored from persistent storage.
//!
//! The serde representation of [`User`] and [`Blog`] doubles as the cache
//! payload, so every field (timestamps included) round-trips losslessly.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::error::DomainError;

pub type UserId = i64;
pub type BlogId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub bio: String,
    pub profile_image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Owner-editable slice of a user profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: String,
    pub bio: String,
    pub profile_image: String,
}

impl User {
    pub const ENTITY: &'static str = "user";

    /// Build an unsaved user; the store assigns the id.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: 0,
            username: username.into(),
            email: email.into(),
            display_name: display_name.into(),
            bio: String::new(),
            profile_image: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks username, email and display name in that order.
    pub fn validate(&self) -> Result<(), DomainError> {
        if is_blank(&self.username) {
            return Err(DomainError::invalid_field(Self::ENTITY, "username"));
        }
        if is_blank(&self.email) {
            return Err(DomainError::invalid_field(Self::ENTITY, "email"));
        }
        if is_blank(&self.display_name) {
            return Err(DomainError::invalid_field(Self::ENTITY, "display_name"));
        }
        Ok(())
    }

    pub fn apply_profile(&mut self, update: ProfileUpdate, now: OffsetDateTime) {
        self.display_name = update.display_name;
        self.bio = update.bio;
        self.profile_image = update.profile_image;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: BlogId,
    pub title: String,
    pub description: String,
    pub body: String,
    pub author_id: UserId,
    /// Author snapshot joined in by the store on single-blog reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    pub likes_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogContent {
    pub title: String,
    pub description: String,
    pub body: String,
}

impl Blog {
    pub const ENTITY: &'static str = "blog";

    pub fn new(content: BlogContent, author_id: UserId, now: OffsetDateTime) -> Self {
        Self {
            id: 0,
            title: content.title,
            description: content.description,
            body: content.body,
            author_id,
            author: None,
            likes_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks title, body and author in that order.
    pub fn validate(&self) -> Result<(), DomainError> {
        if is_blank(&self.title) {
            return Err(DomainError::invalid_field(Self::ENTITY, "title"));
        }
        if is_blank(&self.body) {
            return Err(DomainError::invalid_field(Self::ENTITY, "body"));
        }
        if self.author_id == 0 {
            return Err(DomainError::invalid_field(Self::ENTITY, "author_id"));
        }
        Ok(())
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }

    /// Replace the editable content; the author never changes.
    pub fn apply_content(&mut self, content: BlogContent, now: OffsetDateTime) {
        self.title = content.title;
        self.description = content.description;
        self.body = content.body;
        self.updated_at = now;
    }
}

/// Derived per-user counters, computed on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub followers_count: i64,
    pub following_count: i64,
    pub blogs_count: i64,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
