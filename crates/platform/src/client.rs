use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Author of a post as seen by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Account handle without the leading `@`.
    pub handle: String,
    /// Free-form display name.
    pub name: String,
    /// Profile bio (empty when the account has none).
    pub bio: String,
}

/// A fetched post that may receive a correction. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub author: Author,
    pub text: String,
    /// Platform-assigned "possibly sensitive" flag.
    pub sensitive: bool,
    /// True when the platform reports this post as a retweet.
    pub retweet: bool,
}

impl Post {
    /// Plain post with an author whose display name equals the handle.
    pub fn new(id: u64, handle: impl Into<String>, text: impl Into<String>) -> Self {
        let handle = handle.into();
        Self {
            id,
            author: Author {
                name: handle.clone(),
                handle,
                bio: String::new(),
            },
            text: text.into(),
            sensitive: false,
            retweet: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.author.name = name.into();
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.author.bio = bio.into();
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub lang: String,
    pub count: u32,
}

/// Mentions timeline request. `since_id` is exclusive; `None` fetches the newest page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MentionsQuery {
    pub count: u32,
    pub since_id: Option<u64>,
}

/// Reply to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: String,
    pub in_reply_to: u64,
}

/// Platform acknowledgement of a published reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostedReply {
    pub id: u64,
}

/// Error type for platform operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("rate limited")]
    RateLimited,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

pub type PlatformFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, PlatformError>> + Send + 'a>>;

/// The social platform the bot talks to.
pub trait Platform: Send + Sync {
    fn name(&self) -> &str;

    fn search(&self, query: SearchQuery) -> PlatformFuture<'_, Vec<Post>>;

    fn mentions(&self, query: MentionsQuery) -> PlatformFuture<'_, Vec<Post>>;

    fn reply(&self, reply: Reply) -> PlatformFuture<'_, PostedReply>;
}

/// In-memory platform for tests. Serves canned pages and records everything sent to it.
#[derive(Debug)]
pub struct MockPlatform {
    search_page: Mutex<Result<Vec<Post>, PlatformError>>,
    mention_page: Mutex<Result<Vec<Post>, PlatformError>>,
    reply_error: Option<PlatformError>,
    searches: Mutex<Vec<SearchQuery>>,
    mention_queries: Mutex<Vec<MentionsQuery>>,
    sent: Mutex<Vec<Reply>>,
    next_id: AtomicU64,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            search_page: Mutex::new(Ok(Vec::new())),
            mention_page: Mutex::new(Ok(Vec::new())),
            reply_error: None,
            searches: Mutex::new(Vec::new()),
            mention_queries: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(10_000),
        }
    }

    pub fn with_search(self, posts: Vec<Post>) -> Self {
        *lock(&self.search_page) = Ok(posts);
        self
    }

    pub fn with_mentions(self, posts: Vec<Post>) -> Self {
        *lock(&self.mention_page) = Ok(posts);
        self
    }

    pub fn failing_search(self, err: PlatformError) -> Self {
        *lock(&self.search_page) = Err(err);
        self
    }

    pub fn failing_mentions(self, err: PlatformError) -> Self {
        *lock(&self.mention_page) = Err(err);
        self
    }

    pub fn failing_replies(mut self, err: PlatformError) -> Self {
        self.reply_error = Some(err);
        self
    }

    /// Replace the mentions page served from now on.
    pub fn set_mentions(&self, posts: Vec<Post>) {
        *lock(&self.mention_page) = Ok(posts);
    }

    /// Replies received so far, including ones that were answered with an error.
    pub fn sent(&self) -> Vec<Reply> {
        lock(&self.sent).clone()
    }

    pub fn searches(&self) -> Vec<SearchQuery> {
        lock(&self.searches).clone()
    }

    pub fn mention_queries(&self) -> Vec<MentionsQuery> {
        lock(&self.mention_queries).clone()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Platform for MockPlatform {
    fn name(&self) -> &str {
        "mock"
    }

    fn search(&self, query: SearchQuery) -> PlatformFuture<'_, Vec<Post>> {
        let count = query.count as usize;
        lock(&self.searches).push(query);
        let page = lock(&self.search_page)
            .clone()
            .map(|posts| posts.into_iter().take(count).collect());
        Box::pin(async move { page })
    }

    fn mentions(&self, query: MentionsQuery) -> PlatformFuture<'_, Vec<Post>> {
        lock(&self.mention_queries).push(query);
        let page = lock(&self.mention_page).clone().map(|posts| {
            posts
                .into_iter()
                .filter(|p| query.since_id.is_none_or(|since| p.id > since))
                .take(query.count as usize)
                .collect()
        });
        Box::pin(async move { page })
    }

    fn reply(&self, reply: Reply) -> PlatformFuture<'_, PostedReply> {
        lock(&self.sent).push(reply);
        let result = match &self.reply_error {
            Some(err) => Err(err.clone()),
            None => Ok(PostedReply {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
            }),
        };
        Box::pin(async move { result })
    }
}
