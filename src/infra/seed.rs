//! Sample data for local development.
//!
//! Re-running is safe: users are matched by username, blogs by author and
//! title, and follow/like edges are idempotent in the store.

use time::OffsetDateTime;
use tracing::info;

use crate::application::pagination::{MAX_LIMIT, PageRequest};
use crate::application::repos::{BlogsRepo, RepoError, UsersRepo};
use crate::domain::entities::{Blog, BlogContent, BlogId, User, UserId};

struct SeedUser {
    username: &'static str,
    email: &'static str,
    display_name: &'static str,
}

struct SeedBlog {
    title: &'static str,
    description: &'static str,
    body: &'static str,
    author: usize,
}

const USERS: [SeedUser; 3] = [
    SeedUser {
        username: "alice",
        email: "alice@example.com",
        display_name: "Alice Wonder",
    },
    SeedUser {
        username: "bob",
        email: "bob@example.com",
        display_name: "Bob Builder",
    },
    SeedUser {
        username: "charlie",
        email: "charlie@example.com",
        display_name: "Charlie Brown",
    },
];

const BLOGS: [SeedBlog; 5] = [
    SeedBlog {
        title: "Getting Started with Rust",
        description: "A beginner's guide to Rust programming",
        body: "Rust is a language empowering everyone to build reliable and efficient software. \
               In this guide we walk through ownership, borrowing and the tooling around cargo.",
        author: 0,
    },
    SeedBlog {
        title: "Building RESTful APIs",
        description: "How to build clean REST APIs",
        body: "RESTful APIs are the backbone of modern web applications. This post shares \
               patterns for routing, error envelopes and pagination.",
        author: 0,
    },
    SeedBlog {
        title: "Docker for Beginners",
        description: "Understanding containerization",
        body: "Docker changed how we deploy applications. Let's look at what containers are \
               and why they are useful.",
        author: 1,
    },
    SeedBlog {
        title: "Database Design Tips",
        description: "Essential database design principles",
        body: "Good database design is crucial for performance and maintainability. Here are \
               some principles worth following.",
        author: 1,
    },
    SeedBlog {
        title: "The Art of Code Review",
        description: "How to give and receive effective code reviews",
        body: "Code reviews catch bugs, spread knowledge and keep quality up. A few habits make \
               them far more useful.",
        author: 2,
    },
];

/// (follower, following) as indexes into [`USERS`].
const FOLLOWS: [(usize, usize); 5] = [(0, 1), (0, 2), (1, 0), (2, 0), (2, 1)];

/// (blog, user) as indexes into [`BLOGS`] and [`USERS`]; charlie likes everything.
const LIKES: [(usize, usize); 9] = [
    (1, 0),
    (2, 0),
    (0, 1),
    (4, 1),
    (0, 2),
    (1, 2),
    (2, 2),
    (3, 2),
    (4, 2),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users_created: usize,
    pub blogs_created: usize,
    pub follows: usize,
    pub likes: usize,
}

pub async fn seed(users: &dyn UsersRepo, blogs: &dyn BlogsRepo) -> Result<SeedSummary, RepoError> {
    let mut summary = SeedSummary::default();
    let now = OffsetDateTime::now_utc();

    let mut user_ids: Vec<UserId> = Vec::with_capacity(USERS.len());
    for demo in &USERS {
        let user = match users.find_user_by_username(demo.username).await? {
            Some(existing) => existing,
            None => {
                let created = users
                    .create_user(&User::new(
                        demo.username,
                        demo.email,
                        demo.display_name,
                        now,
                    ))
                    .await?;
                summary.users_created += 1;
                info!(
                    target = "blogo::seed",
                    user_id = created.id,
                    username = demo.username,
                    "seeded user"
                );
                created
            }
        };
        user_ids.push(user.id);
    }

    let mut blog_ids: Vec<BlogId> = Vec::with_capacity(BLOGS.len());
    for post in &BLOGS {
        let author_id = user_ids[post.author];
        let existing = blogs
            .list_blogs_by_author(author_id, PageRequest::new(MAX_LIMIT, 0))
            .await?
            .into_iter()
            .find(|blog| blog.title == post.title);

        let blog = match existing {
            Some(blog) => blog,
            None => {
                let draft = Blog::new(
                    BlogContent {
                        title: post.title.to_string(),
                        description: post.description.to_string(),
                        body: post.body.to_string(),
                    },
                    author_id,
                    now,
                );
                let created = blogs.create_blog(&draft).await?;
                summary.blogs_created += 1;
                info!(
                    target = "blogo::seed",
                    blog_id = created.id,
                    author_id,
                    "seeded blog"
                );
                created
            }
        };
        blog_ids.push(blog.id);
    }

    for (follower, following) in FOLLOWS {
        users
            .create_follow(user_ids[follower], user_ids[following])
            .await?;
        summary.follows += 1;
    }

    for (blog, user) in LIKES {
        blogs.create_like(blog_ids[blog], user_ids[user]).await?;
        summary.likes += 1;
    }

    info!(
        target = "blogo::seed",
        users_created = summary.users_created,
        blogs_created = summary.blogs_created,
        follows = summary.follows,
        likes = summary.likes,
        "seeding complete"
    );

    Ok(summary)
}
