use async_trait::async_trait;
use futures::try_join;

use crate::application::pagination::PageRequest;
use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::entities::{User, UserId, UserStats};

use super::PostgresRepositories;
use super::types::{USER_COLUMNS, UserRow};
use super::util::map_sqlx_error;

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn create_user(&self, user: &User) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, display_name, bio, profile_image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, email, display_name, bio, profile_image, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.bio)
        .bind(&user.profile_image)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(User::from))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(User::from))
    }

    async fn update_user(&self, user: &User) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET display_name = $1, bio = $2, profile_image = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(&user.display_name)
        .bind(&user.bio)
        .bind(&user.profile_image)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn create_follow(&self, follower: UserId, following: UserId) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO followers (follower_id, following_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, following_id) DO NOTHING
            "#,
        )
        .bind(follower)
        .bind(following)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_follow(&self, follower: UserId, following: UserId) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM followers WHERE follower_id = $1 AND following_id = $2")
            .bind(follower)
            .bind(following)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn is_following(&self, follower: UserId, following: UserId) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM followers WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower)
        .bind(following)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_followers(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<User>, RepoError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u \
             INNER JOIN followers f ON u.id = f.follower_id \
             WHERE f.following_id = $1 \
             ORDER BY f.created_at DESC, f.id DESC \
             LIMIT $2 OFFSET $3"
        );
        self.fetch_users(&sql, user_id, page).await
    }

    async fn list_following(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<User>, RepoError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u \
             INNER JOIN followers f ON u.id = f.following_id \
             WHERE f.follower_id = $1 \
             ORDER BY f.created_at DESC, f.id DESC \
             LIMIT $2 OFFSET $3"
        );
        self.fetch_users(&sql, user_id, page).await
    }

    async fn user_stats(&self, user_id: UserId) -> Result<UserStats, RepoError> {
        let pool = self.pool();
        let count = move |sql: &'static str| {
            sqlx::query_scalar::<_, i64>(sql)
                .bind(user_id)
                .fetch_one(pool)
        };

        let (followers_count, following_count, blogs_count) = try_join!(
            count("SELECT COUNT(*) FROM followers WHERE following_id = $1"),
            count("SELECT COUNT(*) FROM followers WHERE follower_id = $1"),
            count("SELECT COUNT(*) FROM blogs WHERE author_id = $1"),
        )
        .map_err(map_sqlx_error)?;

        Ok(UserStats {
            followers_count,
            following_count,
            blogs_count,
        })
    }
}

impl PostgresRepositories {
    /// Runs a `(id, limit, offset)` user listing.
    pub(super) async fn fetch_users(
        &self,
        sql: &str,
        id: i64,
        page: PageRequest,
    ) -> Result<Vec<User>, RepoError> {
        let rows = sqlx::query_as::<_, UserRow>(sql)
            .bind(id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}
