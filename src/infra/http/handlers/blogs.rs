use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use blogo_api_types::{
    BlogListQuery, BlogListResponse, BlogResponse, BlogWriteRequest, LikeAction, LikeRequest,
    MessageResponse, PageQuery, UserListResponse,
};

use crate::application::auth::Principal;
use crate::application::blogs::{CreateBlogCommand, UpdateBlogCommand};
use crate::application::pagination::PageRequest;
use crate::infra::http::error::ApiError;
use crate::infra::http::{AppState, Viewer};

use super::users::user_list;
use super::{blog_view, json_body, parse_id};

const INVALID_BLOG_ID: &str = "Invalid blog id";

pub async fn list_blogs(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<Json<BlogListResponse>, ApiError> {
    let page = PageRequest::from_query(query.limit.as_deref(), query.offset.as_deref());

    let blogs = match query.author {
        Some(author_id) if author_id > 0 => state.blogs.list_by_author(author_id, page).await?,
        Some(_) => return Err(ApiError::invalid_input("Invalid author id", None)),
        None => state.blogs.list(page).await?,
    };

    Ok(Json(BlogListResponse {
        blogs: blogs.into_iter().map(blog_view).collect(),
        limit: page.limit,
        offset: page.offset,
    }))
}

pub async fn create_blog(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<BlogWriteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    let blog = state
        .blogs
        .create(CreateBlogCommand {
            title: request.title,
            description: request.description,
            body: request.body,
            author_id: principal.user_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BlogResponse {
            blog: blog_view(blog),
            liked: None,
        }),
    ))
}

pub async fn get_blog(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(raw_id): Path<String>,
) -> Result<Json<BlogResponse>, ApiError> {
    let id = parse_id(&raw_id, INVALID_BLOG_ID)?;
    let blog = state.blogs.get_by_id(id).await?;

    let liked = match viewer.0 {
        Some(principal) => Some(state.blogs.is_liked_by(id, principal.user_id).await?),
        None => None,
    };

    Ok(Json(BlogResponse {
        blog: blog_view(blog),
        liked,
    }))
}

pub async fn like_action(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
    payload: Result<Json<LikeRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&raw_id, INVALID_BLOG_ID)?;
    let request = json_body(payload)?;

    state.blogs.get_by_id(id).await?;

    let message = match request.action {
        LikeAction::Like => {
            state.blogs.like(id, principal.user_id).await?;
            "liked"
        }
        LikeAction::Unlike => {
            state.blogs.unlike(id, principal.user_id).await?;
            "unliked"
        }
    };

    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

pub async fn update_blog(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
    payload: Result<Json<BlogWriteRequest>, JsonRejection>,
) -> Result<Json<BlogResponse>, ApiError> {
    let id = parse_id(&raw_id, INVALID_BLOG_ID)?;
    let request = json_body(payload)?;

    let blog = state
        .blogs
        .update(UpdateBlogCommand {
            id,
            title: request.title,
            description: request.description,
            body: request.body,
            user_id: principal.user_id,
        })
        .await?;

    Ok(Json(BlogResponse {
        blog: blog_view(blog),
        liked: None,
    }))
}

pub async fn delete_blog(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&raw_id, INVALID_BLOG_ID)?;
    state.blogs.delete(id, principal.user_id).await?;

    Ok(Json(MessageResponse {
        message: "blog deleted".to_string(),
    }))
}

pub async fn list_likers(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let id = parse_id(&raw_id, INVALID_BLOG_ID)?;
    let page = PageRequest::from_query(query.limit.as_deref(), query.offset.as_deref());
    let users = state.blogs.likers(id, page).await?;
    Ok(Json(user_list(users, page)))
}
