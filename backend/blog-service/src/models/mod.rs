/// Data models for blog-service
///
/// This module defines structures for:
/// - User, Group, Post, Comment, Follow: rows of the content store
/// - PostView, ProfileView, PostDetail: read models composed for feeds
/// - NewPost, EditPost, NewComment: validated write payloads
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Characters of post text used as the post's display string.
pub const POST_PREVIEW_CHARS: usize = 15;

/// Identity on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(Uuid),
}

impl Viewer {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(*id),
        }
    }
}

/// Registered author identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Community a post can be published to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
}

impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview: String = self.text.chars().take(POST_PREVIEW_CHARS).collect();
        f.write_str(&preview)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Uuid,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// Directed follow edge: `user_id` follows `author_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Group summary embedded in feed rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub slug: String,
    pub title: String,
}

/// A post as shown in a feed: joined with its author and group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub author: String,
    pub group: Option<GroupRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author_id: Uuid,
    pub author: String,
}

/// Header of an author page.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub author: User,
    pub post_count: usize,
    /// Whether the current viewer follows this author.
    pub following: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostView,
    /// Number of posts written by the post's author.
    pub author_post_count: usize,
    pub comments: Vec<CommentView>,
}

/// Payload of the post creation form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewPost {
    #[validate(custom(function = "validate_not_blank", message = "Enter the post text"))]
    pub text: String,
    pub group_id: Option<i64>,
    #[validate(length(max = 255))]
    pub image: Option<String>,
}

/// Payload of the post edit form. Replaces text, group and image.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EditPost {
    #[validate(custom(function = "validate_not_blank", message = "Enter the post text"))]
    pub text: String,
    pub group_id: Option<i64>,
    #[validate(length(max = 255))]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewComment {
    #[validate(custom(function = "validate_not_blank", message = "Enter the comment text"))]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(
        length(min = 1, max = 150),
        custom(function = "validate_username")
    )]
    pub username: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewGroup {
    #[validate(length(min = 1, max = 50), custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_username(value: &str) -> Result<(), validator::ValidationError> {
    let ok = value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !ok {
        return Err(validator::ValidationError::new("invalid_username"));
    }
    Ok(())
}

fn validate_slug(value: &str) -> Result<(), validator::ValidationError> {
    let ok = value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if !ok {
        return Err(validator::ValidationError::new("invalid_slug"));
    }
    Ok(())
}
