use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::application::pagination::PageRequest;
use crate::application::repos::{BlogsRepo, RepoError};
use crate::cache::CacheAside;
use crate::domain::entities::{Blog, BlogContent, BlogId, User, UserId};
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("invalid {field}")]
    InvalidInput { field: &'static str },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("blog already exists (`{constraint}`)")]
    Conflict { constraint: String },
    #[error("user is not the author of this blog")]
    NotOwner,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<DomainError> for BlogError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidField { field, .. } => Self::InvalidInput { field },
        }
    }
}

impl BlogError {
    fn not_found(id: BlogId) -> Self {
        Self::NotFound {
            entity: Blog::ENTITY,
            id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateBlogCommand {
    pub title: String,
    pub description: String,
    pub body: String,
    pub author_id: UserId,
}

#[derive(Debug, Clone)]
pub struct UpdateBlogCommand {
    pub id: BlogId,
    pub title: String,
    pub description: String,
    pub body: String,
    /// Caller; must be the author.
    pub user_id: UserId,
}

#[derive(Clone)]
pub struct BlogService {
    blogs: Arc<dyn BlogsRepo>,
    cache: CacheAside,
}

impl BlogService {
    pub fn new(blogs: Arc<dyn BlogsRepo>, cache: CacheAside) -> Self {
        Self { blogs, cache }
    }

    pub async fn create(&self, command: CreateBlogCommand) -> Result<Blog, BlogError> {
        let CreateBlogCommand {
            title,
            description,
            body,
            author_id,
        } = command;

        let draft = Blog::new(
            BlogContent {
                title,
                description,
                body,
            },
            author_id,
            OffsetDateTime::now_utc(),
        );
        draft.validate()?;

        let blog = self
            .blogs
            .create_blog(&draft)
            .await
            .map_err(map_write_error)?;
        self.cache.invalidate_blog_lists().await;

        info!(
            target = "application::blogs::create",
            blog_id = blog.id,
            author_id,
            "blog created"
        );

        Ok(blog)
    }

    /// Read-through lookup. The cached unit is the whole snapshot, so the
    /// like count may lag by up to the blog TTL when likes bypass this node.
    pub async fn get_by_id(&self, id: BlogId) -> Result<Blog, BlogError> {
        if let Some(blog) = self.cache.cached_blog(id).await {
            return Ok(blog);
        }

        let blog = self
            .blogs
            .find_blog_by_id(id)
            .await?
            .ok_or_else(|| BlogError::not_found(id))?;

        self.cache.store_blog(&blog).await;
        Ok(blog)
    }

    pub async fn list(&self, page: PageRequest) -> Result<Vec<Blog>, BlogError> {
        self.blogs.list_blogs(page).await.map_err(BlogError::from)
    }

    pub async fn list_by_author(
        &self,
        author_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<Blog>, BlogError> {
        self.blogs
            .list_blogs_by_author(author_id, page)
            .await
            .map_err(BlogError::from)
    }

    pub async fn update(&self, command: UpdateBlogCommand) -> Result<Blog, BlogError> {
        let UpdateBlogCommand {
            id,
            title,
            description,
            body,
            user_id,
        } = command;

        let mut blog = self.load_owned(id, user_id).await?;

        blog.apply_content(
            BlogContent {
                title,
                description,
                body,
            },
            OffsetDateTime::now_utc(),
        );
        blog.validate()?;

        self.blogs
            .update_blog(&blog)
            .await
            .map_err(|err| match err {
                RepoError::NotFound => BlogError::not_found(id),
                other => map_write_error(other),
            })?;
        self.cache.invalidate_blog(id).await;
        self.cache.invalidate_blog_lists().await;

        Ok(blog)
    }

    pub async fn delete(&self, id: BlogId, user_id: UserId) -> Result<(), BlogError> {
        let blog = self.load_owned(id, user_id).await?;

        // a concurrent delete may win between the read and this statement
        let affected = self.blogs.delete_blog(id, blog.author_id).await?;
        if affected == 0 {
            return Err(BlogError::not_found(id));
        }

        self.cache.invalidate_blog(id).await;
        self.cache.invalidate_blog_lists().await;

        info!(
            target = "application::blogs::delete",
            blog_id = id,
            user_id,
            "blog deleted"
        );

        Ok(())
    }

    pub async fn like(&self, blog_id: BlogId, user_id: UserId) -> Result<(), BlogError> {
        self.blogs.create_like(blog_id, user_id).await?;
        self.cache.invalidate_blog(blog_id).await;
        Ok(())
    }

    pub async fn unlike(&self, blog_id: BlogId, user_id: UserId) -> Result<(), BlogError> {
        self.blogs.delete_like(blog_id, user_id).await?;
        self.cache.invalidate_blog(blog_id).await;
        Ok(())
    }

    pub async fn is_liked_by(&self, blog_id: BlogId, user_id: UserId) -> Result<bool, BlogError> {
        self.blogs
            .is_liked(blog_id, user_id)
            .await
            .map_err(BlogError::from)
    }

    pub async fn likers(&self, blog_id: BlogId, page: PageRequest) -> Result<Vec<User>, BlogError> {
        self.blogs
            .list_likers(blog_id, page)
            .await
            .map_err(BlogError::from)
    }

    /// Store read (never the cache) followed by the ownership check.
    async fn load_owned(&self, id: BlogId, user_id: UserId) -> Result<Blog, BlogError> {
        let blog = self
            .blogs
            .find_blog_by_id(id)
            .await?
            .ok_or_else(|| BlogError::not_found(id))?;

        if !blog.is_owned_by(user_id) {
            return Err(BlogError::NotOwner);
        }
        Ok(blog)
    }
}

fn map_write_error(err: RepoError) -> BlogError {
    match err {
        RepoError::Duplicate { constraint } => BlogError::Conflict { constraint },
        other => BlogError::Repo(other),
    }
}
