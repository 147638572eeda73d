use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use blogo_api_types::{
    FollowAction, FollowRequest, MessageResponse, PageQuery, RegisterUserRequest,
    RegisterUserResponse, UpdateProfileRequest, UserListResponse, UserProfileResponse,
};
use tracing::warn;

use crate::application::auth::Principal;
use crate::application::pagination::PageRequest;
use crate::application::users::RegisterUserCommand;
use crate::domain::entities::{ProfileUpdate, User};
use crate::infra::http::AppState;
use crate::infra::http::error::ApiError;

use super::{json_body, parse_id, stats_view, user_view};

const INVALID_USER_ID: &str = "Invalid user id";

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    let registration = state
        .users
        .register(RegisterUserCommand {
            username: request.username,
            email: request.email,
            display_name: request.display_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterUserResponse {
            user: user_view(registration.user),
            token: registration.token,
        }),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    let id = parse_id(&raw_id, INVALID_USER_ID)?;
    let profile = state.users.get_with_stats(id).await?;

    let (stats, stats_error) = match profile.stats {
        Ok(stats) => (Some(stats_view(stats)), None),
        Err(_) => (None, Some("user stats are temporarily unavailable".to_string())),
    };

    Ok(Json(UserProfileResponse {
        user: user_view(profile.user),
        stats,
        stats_error,
    }))
}

pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.users.get_by_username(&username).await? {
        Some(user) => Ok(Json(user_view(user))),
        None => Err(ApiError::not_found("User not found")),
    }
}

pub async fn follow_action(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
    payload: Result<Json<FollowRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let target = parse_id(&raw_id, INVALID_USER_ID)?;
    let request = json_body(payload)?;

    // resolve the target first so an unknown id is a 404 rather than a constraint error
    if target != principal.user_id {
        state.users.get_by_id(target).await?;
    }

    let message = match request.action {
        FollowAction::Follow => {
            state.users.follow(principal.user_id, target).await?;
            "followed"
        }
        FollowAction::Unfollow => {
            state.users.unfollow(principal.user_id, target).await?;
            "unfollowed"
        }
    };

    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id, INVALID_USER_ID)?;
    if id != principal.user_id {
        warn!(
            target = "blogo::http::users",
            user_id = principal.user_id,
            target_user_id = id,
            "profile update rejected for non-owner"
        );
        return Err(ApiError::forbidden("Only the owner may update this profile"));
    }

    let request = json_body(payload)?;
    let user = state
        .users
        .update_profile(
            id,
            ProfileUpdate {
                display_name: request.display_name,
                bio: request.bio,
                profile_image: request.profile_image,
            },
        )
        .await?;

    Ok(Json(user_view(user)))
}

pub async fn list_following(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let id = parse_id(&raw_id, INVALID_USER_ID)?;
    let page = PageRequest::from_query(query.limit.as_deref(), query.offset.as_deref());
    let users = state.users.following(id, page).await?;
    Ok(Json(user_list(users, page)))
}

pub async fn list_followers(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let id = parse_id(&raw_id, INVALID_USER_ID)?;
    let page = PageRequest::from_query(query.limit.as_deref(), query.offset.as_deref());
    let users = state.users.followers(id, page).await?;
    Ok(Json(user_list(users, page)))
}

pub(super) fn user_list(users: Vec<User>, page: PageRequest) -> UserListResponse {
    UserListResponse {
        users: users.into_iter().map(user_view).collect(),
        limit: page.limit,
        offset: page.offset,
    }
}
