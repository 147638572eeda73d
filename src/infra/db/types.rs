use time::OffsetDateTime;

use crate::domain::entities::{Blog, User};

pub(crate) const USER_COLUMNS: &str =
    "u.id, u.username, u.email, u.display_name, u.bio, u.profile_image, u.created_at, u.updated_at";

/// Blog joined with its author and a live like count.
pub(crate) const BLOG_SELECT: &str = r#"
    SELECT b.id, b.title, b.description, b.body, b.author_id,
           b.created_at, b.updated_at,
           (SELECT COUNT(*) FROM likes l WHERE l.blog_id = b.id) AS likes_count,
           u.username AS author_username,
           u.email AS author_email,
           u.display_name AS author_display_name,
           u.bio AS author_bio,
           u.profile_image AS author_profile_image,
           u.created_at AS author_created_at,
           u.updated_at AS author_updated_at
    FROM blogs b
    INNER JOIN users u ON u.id = b.author_id
"#;

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) display_name: String,
    pub(crate) bio: String,
    pub(crate) profile_image: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            display_name: row.display_name,
            bio: row.bio,
            profile_image: row.profile_image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BlogRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) body: String,
    pub(crate) author_id: i64,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
    pub(crate) likes_count: i64,
    pub(crate) author_username: String,
    pub(crate) author_email: String,
    pub(crate) author_display_name: String,
    pub(crate) author_bio: String,
    pub(crate) author_profile_image: String,
    pub(crate) author_created_at: OffsetDateTime,
    pub(crate) author_updated_at: OffsetDateTime,
}

impl From<BlogRow> for Blog {
    fn from(row: BlogRow) -> Self {
        let author = User {
            id: row.author_id,
            username: row.author_username,
            email: row.author_email,
            display_name: row.author_display_name,
            bio: row.author_bio,
            profile_image: row.author_profile_image,
            created_at: row.author_created_at,
            updated_at: row.author_updated_at,
        };

        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            body: row.body,
            author_id: row.author_id,
            author: Some(author),
            likes_count: row.likes_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
