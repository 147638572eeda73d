use async_trait::async_trait;

use crate::application::pagination::PageRequest;
use crate::application::repos::{BlogsRepo, RepoError};
use crate::domain::entities::{Blog, BlogId, User, UserId};

use super::PostgresRepositories;
use super::types::{BLOG_SELECT, BlogRow, USER_COLUMNS};
use super::util::map_sqlx_error;

#[async_trait]
impl BlogsRepo for PostgresRepositories {
    async fn create_blog(&self, blog: &Blog) -> Result<Blog, RepoError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO blogs (title, description, body, author_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&blog.title)
        .bind(&blog.description)
        .bind(&blog.body)
        .bind(blog.author_id)
        .bind(blog.created_at)
        .bind(blog.updated_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut created = blog.clone();
        created.id = id;
        Ok(created)
    }

    async fn find_blog_by_id(&self, id: BlogId) -> Result<Option<Blog>, RepoError> {
        let sql = format!("{BLOG_SELECT} WHERE b.id = $1");
        let row = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Blog::from))
    }

    async fn list_blogs(&self, page: PageRequest) -> Result<Vec<Blog>, RepoError> {
        let sql = format!("{BLOG_SELECT} ORDER BY b.created_at DESC, b.id DESC LIMIT $1 OFFSET $2");
        let rows = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Blog::from).collect())
    }

    async fn list_blogs_by_author(
        &self,
        author_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<Blog>, RepoError> {
        let sql = format!(
            "{BLOG_SELECT} WHERE b.author_id = $1 \
             ORDER BY b.created_at DESC, b.id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(author_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Blog::from).collect())
    }

    async fn update_blog(&self, blog: &Blog) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE blogs
            SET title = $1, description = $2, body = $3, updated_at = $4
            WHERE id = $5 AND author_id = $6
            "#,
        )
        .bind(&blog.title)
        .bind(&blog.description)
        .bind(&blog.body)
        .bind(blog.updated_at)
        .bind(blog.id)
        .bind(blog.author_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_blog(&self, id: BlogId, author_id: UserId) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn create_like(&self, blog_id: BlogId, user_id: UserId) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO likes (blog_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (blog_id, user_id) DO NOTHING
            "#,
        )
        .bind(blog_id)
        .bind(user_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_like(&self, blog_id: BlogId, user_id: UserId) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM likes WHERE blog_id = $1 AND user_id = $2")
            .bind(blog_id)
            .bind(user_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn is_liked(&self, blog_id: BlogId, user_id: UserId) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE blog_id = $1 AND user_id = $2)",
        )
        .bind(blog_id)
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_likers(
        &self,
        blog_id: BlogId,
        page: PageRequest,
    ) -> Result<Vec<User>, RepoError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u \
             INNER JOIN likes l ON u.id = l.user_id \
             WHERE l.blog_id = $1 \
             ORDER BY l.created_at DESC, l.id DESC \
             LIMIT $2 OFFSET $3"
        );
        self.fetch_users(&sql, blog_id, page).await
    }
}
