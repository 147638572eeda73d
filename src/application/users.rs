use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::auth::TokenIssuer;
use crate::application::pagination::PageRequest;
use crate::application::repos::{RepoError, UsersRepo};
use crate::cache::CacheAside;
use crate::domain::entities::{ProfileUpdate, User, UserId, UserStats};
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("invalid {field}")]
    InvalidInput { field: &'static str },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("user already exists (`{constraint}`)")]
    Conflict { constraint: String },
    #[error("cannot follow yourself")]
    SelfFollowNotAllowed,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<DomainError> for UserError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidField { field, .. } => Self::InvalidInput { field },
        }
    }
}

impl UserError {
    fn not_found(id: UserId) -> Self {
        Self::NotFound {
            entity: User::ENTITY,
            id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterUserCommand {
    pub username: String,
    pub email: String,
    pub display_name: String,
}

/// Newly created user. `token` is `None` when signing failed; the account
/// exists either way.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub token: Option<String>,
}

/// A user with its derived counters. A stats failure does not fail the read.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user: User,
    pub stats: Result<UserStats, RepoError>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UsersRepo>,
    cache: CacheAside,
    tokens: Arc<dyn TokenIssuer>,
}

impl UserService {
    pub fn new(users: Arc<dyn UsersRepo>, cache: CacheAside, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self {
            users,
            cache,
            tokens,
        }
    }

    pub async fn register(&self, command: RegisterUserCommand) -> Result<Registration, UserError> {
        let RegisterUserCommand {
            username,
            email,
            display_name,
        } = command;

        let draft = User::new(username, email, display_name, OffsetDateTime::now_utc());
        draft.validate()?;

        let user = self.users.create_user(&draft).await.map_err(|err| match err {
            RepoError::Duplicate { constraint } => UserError::Conflict { constraint },
            other => UserError::Repo(other),
        })?;

        self.cache.store_user(&user).await;

        let token = match self.tokens.issue(&user) {
            Ok(token) => Some(token),
            Err(err) => {
                warn!(
                    target = "application::users::register",
                    user_id = user.id,
                    error = %err,
                    "token issuance failed after registration"
                );
                None
            }
        };

        info!(
            target = "application::users::register",
            user_id = user.id,
            username = user.username.as_str(),
            "user registered"
        );

        Ok(Registration { user, token })
    }

    /// Read-through lookup.
    pub async fn get_by_id(&self, id: UserId) -> Result<User, UserError> {
        if let Some(user) = self.cache.cached_user(id).await {
            return Ok(user);
        }

        let user = self
            .users
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| UserError::not_found(id))?;

        self.cache.store_user(&user).await;
        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        self.users
            .find_user_by_username(username)
            .await
            .map_err(UserError::from)
    }

    pub async fn get_with_stats(&self, id: UserId) -> Result<UserProfile, UserError> {
        let user = self.get_by_id(id).await?;
        let stats = self.users.user_stats(id).await;
        if let Err(err) = &stats {
            warn!(
                target = "application::users::get_with_stats",
                user_id = id,
                error = %err,
                "user stats unavailable; returning profile without counters"
            );
        }
        Ok(UserProfile { user, stats })
    }

    pub async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, UserError> {
        let mut user = self
            .users
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| UserError::not_found(id))?;

        user.apply_profile(update, OffsetDateTime::now_utc());
        user.validate()?;

        self.users.update_user(&user).await.map_err(|err| match err {
            RepoError::NotFound => UserError::not_found(id),
            other => UserError::Repo(other),
        })?;
        self.cache.invalidate_user(id).await;

        Ok(user)
    }

    pub async fn follow(&self, follower: UserId, following: UserId) -> Result<(), UserError> {
        if follower == following {
            return Err(UserError::SelfFollowNotAllowed);
        }

        self.users.create_follow(follower, following).await?;
        self.cache.invalidate_user(follower).await;
        self.cache.invalidate_user(following).await;
        Ok(())
    }

    pub async fn unfollow(&self, follower: UserId, following: UserId) -> Result<(), UserError> {
        self.users.delete_follow(follower, following).await?;
        self.cache.invalidate_user(follower).await;
        self.cache.invalidate_user(following).await;
        Ok(())
    }

    pub async fn is_following(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<bool, UserError> {
        self.users
            .is_following(follower, following)
            .await
            .map_err(UserError::from)
    }

    /// Users following `id`.
    pub async fn followers(&self, id: UserId, page: PageRequest) -> Result<Vec<User>, UserError> {
        self.users
            .list_followers(id, page)
            .await
            .map_err(UserError::from)
    }

    /// Users that `id` follows.
    pub async fn following(&self, id: UserId, page: PageRequest) -> Result<Vec<User>, UserError> {
        self.users
            .list_following(id, page)
            .await
            .map_err(UserError::from)
    }
}
