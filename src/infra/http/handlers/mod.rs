//! Request handlers grouped by resource, plus the shared view mapping and
//! input helpers.

pub mod blogs;
pub mod health;
pub mod users;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use blogo_api_types::{BlogView, UserStatsView, UserView};

use crate::domain::entities::{Blog, User, UserStats};

use super::error::ApiError;

pub(crate) fn user_view(user: User) -> UserView {
    UserView {
        id: user.id,
        username: user.username,
        email: user.email,
        display_name: user.display_name,
        bio: user.bio,
        profile_image: user.profile_image,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub(crate) fn blog_view(blog: Blog) -> BlogView {
    BlogView {
        id: blog.id,
        title: blog.title,
        description: blog.description,
        body: blog.body,
        author_id: blog.author_id,
        author: blog.author.map(user_view),
        likes_count: blog.likes_count,
        created_at: blog.created_at,
        updated_at: blog.updated_at,
    }
}

pub(crate) fn stats_view(stats: UserStats) -> UserStatsView {
    UserStatsView {
        followers_count: stats.followers_count,
        following_count: stats.following_count,
        blogs_count: stats.blogs_count,
    }
}

/// Parses a positive numeric path id.
pub(crate) fn parse_id(raw: &str, message: &'static str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::invalid_input(message, Some(raw.to_string()))),
    }
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        ApiError::invalid_input("Invalid request body", Some(rejection.body_text()))
    })
}
