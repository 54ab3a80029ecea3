//! Content store: persistence of users, groups, posts, comments and follows.
//!
//! [`ContentStore`] is the seam between the services and storage. Two
//! implementations ship with the service:
//! - [`PgContentStore`]: PostgreSQL via sqlx (production)
//! - [`MemoryContentStore`]: process-local state (tests, local runs)

mod memory;
mod postgres;

pub use memory::MemoryContentStore;
pub use postgres::PgContentStore;

use crate::error::Result;
use crate::models::{
    Comment, CommentView, EditPost, Follow, Group, NewGroup, NewPost, Post, PostView, User,
};
use uuid::Uuid;

/// Selection criterion of a post listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(Uuid),
    /// Posts written by any of these authors.
    Authors(Vec<Uuid>),
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(*group_id),
            PostFilter::Author(author_id) => post.author_id == *author_id,
            PostFilter::Authors(authors) => authors.contains(&post.author_id),
        }
    }
}

/// Storage operations used by the services.
///
/// Post listings are always ordered newest first (`pub_date DESC, id DESC`).
/// Lookups return `Option`; mapping a miss to a not-found response is the
/// caller's decision.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    // Users
    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, username: &str) -> Result<User>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    // Groups
    /// Fails with `Conflict` when the slug is taken.
    async fn create_group(&self, group: &NewGroup) -> Result<Group>;
    async fn find_group_by_id(&self, group_id: i64) -> Result<Option<Group>>;
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    // Posts
    async fn create_post(&self, author_id: Uuid, post: &NewPost) -> Result<Post>;
    /// Returns the updated post, or `None` when it does not exist.
    async fn update_post(&self, post_id: i64, edit: &EditPost) -> Result<Option<Post>>;
    /// Deletes the post and its comments; returns whether a row was removed.
    async fn delete_post(&self, post_id: i64) -> Result<bool>;
    async fn find_post(&self, post_id: i64) -> Result<Option<Post>>;
    async fn find_post_view(&self, post_id: i64) -> Result<Option<PostView>>;
    async fn count_posts(&self, filter: &PostFilter) -> Result<usize>;
    async fn list_posts(
        &self,
        filter: &PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostView>>;

    // Comments
    async fn create_comment(&self, post_id: i64, author_id: Uuid, text: &str) -> Result<Comment>;
    /// Comments of a post, oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>>;

    // Follow graph
    /// Idempotent insert; returns true if a new edge was created.
    async fn insert_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;
    /// Returns true if an edge was removed.
    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;
    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;
    /// Outgoing edges of a user.
    async fn list_follows(&self, user_id: Uuid) -> Result<Vec<Follow>>;

    /// Health check (optional)
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
