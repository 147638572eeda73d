#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use blogo::application::auth::{AuthError, Claims, TokenIssuer};
use blogo::application::blogs::BlogService;
use blogo::application::pagination::PageRequest;
use blogo::application::repos::{BlogsRepo, RepoError, UsersRepo};
use blogo::application::users::{RegisterUserCommand, UserService};
use blogo::cache::{CacheAside, CacheTtl, MemoryCache};
use blogo::config::CacheSettings;
use blogo::domain::entities::{Blog, BlogId, User, UserId, UserStats};
use blogo::infra::auth::JwtAuthority;

pub const TEST_SECRET: &[u8] = b"integration-test-signing-secret";

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    blogs: BTreeMap<BlogId, Blog>,
    /// (follower, following, sequence)
    follows: Vec<(UserId, UserId, u64)>,
    /// (blog, user, sequence)
    likes: Vec<(BlogId, UserId, u64)>,
    next_user: UserId,
    next_blog: BlogId,
    sequence: u64,
}

impl Tables {
    fn tick(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn hydrate(&self, blog: &Blog) -> Blog {
        let mut blog = blog.clone();
        blog.author = self.users.get(&blog.author_id).cloned();
        blog.likes_count = self.likes.iter().filter(|(b, _, _)| *b == blog.id).count() as i64;
        blog
    }

    fn users_by_edges(&self, mut edges: Vec<(UserId, u64)>, page: PageRequest) -> Vec<User> {
        edges.sort_by(|a, b| b.1.cmp(&a.1));
        edges
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .filter_map(|(id, _)| self.users.get(&id).cloned())
            .collect()
    }

    fn sorted_blogs(&self, filter: impl Fn(&Blog) -> bool, page: PageRequest) -> Vec<Blog> {
        let mut blogs: Vec<Blog> = self.blogs.values().filter(|b| filter(b)).cloned().collect();
        blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        blogs
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .map(|blog| self.hydrate(&blog))
            .collect()
    }
}

/// In-memory stand-in for Postgres that mirrors its constraints.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
    stats_offline: AtomicBool,
    lose_delete_race: AtomicBool,
    user_reads: AtomicUsize,
    blog_reads: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every subsequent call fails as if the database were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_stats_offline(&self, offline: bool) {
        self.stats_offline.store(offline, Ordering::SeqCst);
    }

    /// The next delete removes the row but reports zero affected rows, as if a
    /// concurrent request got there first.
    pub fn lose_next_delete_race(&self) {
        self.lose_delete_race.store(true, Ordering::SeqCst);
    }

    pub fn user_reads(&self) -> usize {
        self.user_reads.load(Ordering::SeqCst)
    }

    pub fn blog_reads(&self) -> usize {
        self.blog_reads.load(Ordering::SeqCst)
    }

    /// Change a blog behind the services' back, bypassing invalidation.
    pub async fn overwrite_blog_title(&self, id: BlogId, title: &str) {
        let mut tables = self.tables.lock().await;
        if let Some(blog) = tables.blogs.get_mut(&id) {
            blog.title = title.to_string();
        }
    }

    pub async fn blog_exists(&self, id: BlogId) -> bool {
        self.tables.lock().await.blogs.contains_key(&id)
    }

    fn ensure_online(&self) -> Result<(), RepoError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RepoError::Persistence("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UsersRepo for InMemoryStore {
    async fn create_user(&self, user: &User) -> Result<User, RepoError> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".into(),
            });
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Duplicate {
                constraint: "users_email_key".into(),
            });
        }
        tables.next_user += 1;
        let mut created = user.clone();
        created.id = tables.next_user;
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        self.ensure_online()?;
        self.user_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), RepoError> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        match tables.users.get_mut(&user.id) {
            Some(stored) => {
                stored.display_name = user.display_name.clone();
                stored.bio = user.bio.clone();
                stored.profile_image = user.profile_image.clone();
                stored.updated_at = user.updated_at;
                Ok(())
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn create_follow(&self, follower: UserId, following: UserId) -> Result<(), RepoError> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        if follower == following {
            return Err(RepoError::Integrity {
                message: "followers_no_self_follow".into(),
            });
        }
        if !tables.users.contains_key(&follower) || !tables.users.contains_key(&following) {
            return Err(RepoError::InvalidInput {
                message: "followers_following_id_fkey".into(),
            });
        }
        if tables
            .follows
            .iter()
            .any(|(a, b, _)| *a == follower && *b == following)
        {
            return Ok(());
        }
        let seq = tables.tick();
        tables.follows.push((follower, following, seq));
        Ok(())
    }

    async fn delete_follow(&self, follower: UserId, following: UserId) -> Result<(), RepoError> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        tables
            .follows
            .retain(|(a, b, _)| !(*a == follower && *b == following));
        Ok(())
    }

    async fn is_following(&self, follower: UserId, following: UserId) -> Result<bool, RepoError> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .follows
            .iter()
            .any(|(a, b, _)| *a == follower && *b == following))
    }

    async fn list_followers(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<User>, RepoError> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        let edges = tables
            .follows
            .iter()
            .filter(|(_, b, _)| *b == user_id)
            .map(|(a, _, seq)| (*a, *seq))
            .collect();
        Ok(tables.users_by_edges(edges, page))
    }

    async fn list_following(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<User>, RepoError> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        let edges = tables
            .follows
            .iter()
            .filter(|(a, _, _)| *a == user_id)
            .map(|(_, b, seq)| (*b, *seq))
            .collect();
        Ok(tables.users_by_edges(edges, page))
    }

    async fn user_stats(&self, user_id: UserId) -> Result<UserStats, RepoError> {
        self.ensure_online()?;
        if self.stats_offline.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        let tables = self.tables.lock().await;
        Ok(UserStats {
            followers_count: tables.follows.iter().filter(|(_, b, _)| *b == user_id).count()
                as i64,
            following_count: tables.follows.iter().filter(|(a, _, _)| *a == user_id).count()
                as i64,
            blogs_count: tables
                .blogs
                .values()
                .filter(|b| b.author_id == user_id)
                .count() as i64,
        })
    }
}

#[async_trait]
impl BlogsRepo for InMemoryStore {
    async fn create_blog(&self, blog: &Blog) -> Result<Blog, RepoError> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&blog.author_id) {
            return Err(RepoError::InvalidInput {
                message: "blogs_author_id_fkey".into(),
            });
        }
        tables.next_blog += 1;
        let mut created = blog.clone();
        created.id = tables.next_blog;
        tables.blogs.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_blog_by_id(&self, id: BlogId) -> Result<Option<Blog>, RepoError> {
        self.ensure_online()?;
        self.blog_reads.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().await;
        Ok(tables.blogs.get(&id).map(|blog| tables.hydrate(blog)))
    }

    async fn list_blogs(&self, page: PageRequest) -> Result<Vec<Blog>, RepoError> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        Ok(tables.sorted_blogs(|_| true, page))
    }

    async fn list_blogs_by_author(
        &self,
        author_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<Blog>, RepoError> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        Ok(tables.sorted_blogs(|b| b.author_id == author_id, page))
    }

    async fn update_blog(&self, blog: &Blog) -> Result<(), RepoError> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        match tables.blogs.get_mut(&blog.id) {
            Some(stored) if stored.author_id == blog.author_id => {
                stored.title = blog.title.clone();
                stored.description = blog.description.clone();
                stored.body = blog.body.clone();
                stored.updated_at = blog.updated_at;
                Ok(())
            }
            _ => Err(RepoError::NotFound),
        }
    }

    async fn delete_blog(&self, id: BlogId, author_id: UserId) -> Result<u64, RepoError> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        let owned = tables
            .blogs
            .get(&id)
            .is_some_and(|blog| blog.author_id == author_id);
        if !owned {
            return Ok(0);
        }
        tables.blogs.remove(&id);
        tables.likes.retain(|(b, _, _)| *b != id);
        if self.lose_delete_race.swap(false, Ordering::SeqCst) {
            return Ok(0);
        }
        Ok(1)
    }

    async fn create_like(&self, blog_id: BlogId, user_id: UserId) -> Result<(), RepoError> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        if !tables.blogs.contains_key(&blog_id) || !tables.users.contains_key(&user_id) {
            return Err(RepoError::InvalidInput {
                message: "likes_blog_id_fkey".into(),
            });
        }
        if tables
            .likes
            .iter()
            .any(|(b, u, _)| *b == blog_id && *u == user_id)
        {
            return Ok(());
        }
        let seq = tables.tick();
        tables.likes.push((blog_id, user_id, seq));
        Ok(())
    }

    async fn delete_like(&self, blog_id: BlogId, user_id: UserId) -> Result<(), RepoError> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        tables
            .likes
            .retain(|(b, u, _)| !(*b == blog_id && *u == user_id));
        Ok(())
    }

    async fn is_liked(&self, blog_id: BlogId, user_id: UserId) -> Result<bool, RepoError> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .likes
            .iter()
            .any(|(b, u, _)| *b == blog_id && *u == user_id))
    }

    async fn list_likers(
        &self,
        blog_id: BlogId,
        page: PageRequest,
    ) -> Result<Vec<User>, RepoError> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        let edges = tables
            .likes
            .iter()
            .filter(|(b, _, _)| *b == blog_id)
            .map(|(_, u, seq)| (*u, *seq))
            .collect();
        Ok(tables.users_by_edges(edges, page))
    }
}

pub fn tokens() -> Arc<JwtAuthority> {
    Arc::new(JwtAuthority::new(
        TEST_SECRET,
        "blogo-api",
        Duration::from_secs(24 * 60 * 60),
    ))
}

pub fn memory_cache() -> CacheAside {
    let settings = CacheSettings::default();
    CacheAside::new(
        Some(Arc::new(MemoryCache::new(settings.capacity))),
        CacheTtl::from(&settings),
    )
}

/// Issuer whose signing key is unusable; verification rejects everything.
pub struct BrokenSigner;

impl TokenIssuer for BrokenSigner {
    fn issue(&self, _user: &User) -> Result<String, AuthError> {
        Err(AuthError::Signing("signing key unavailable".into()))
    }

    fn verify(&self, _token: &str) -> Result<Claims, AuthError> {
        Err(AuthError::Invalid)
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub users: UserService,
    pub blogs: BlogService,
    pub tokens: Arc<dyn TokenIssuer>,
}

impl Harness {
    pub fn new(cache: CacheAside) -> Self {
        Self::with_issuer(cache, tokens())
    }

    pub fn with_issuer(cache: CacheAside, tokens: Arc<dyn TokenIssuer>) -> Self {
        let store = InMemoryStore::new();
        let users = UserService::new(store.clone(), cache.clone(), tokens.clone());
        let blogs = BlogService::new(store.clone(), cache);
        Self {
            store,
            users,
            blogs,
            tokens,
        }
    }

    pub fn cached() -> Self {
        Self::new(memory_cache())
    }

    pub fn uncached() -> Self {
        Self::new(CacheAside::disabled())
    }

    pub async fn register(&self, username: &str) -> User {
        self.users
            .register(RegisterUserCommand {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                display_name: username.to_uppercase(),
            })
            .await
            .expect("register user")
            .user
    }
}
