use super::{ContentStore, PostFilter};
use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentView, EditPost, Follow, Group, GroupRef, NewGroup, NewPost, Post, PostView,
    User,
};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
    last_id: i64,
    last_pub_date: Option<DateTime<Utc>>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    /// Publication timestamps never go backwards, so newest-first order
    /// agrees with insertion order.
    fn next_pub_date(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let pub_date = match self.last_pub_date {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_pub_date = Some(pub_date);
        pub_date
    }

    fn require_user(&self, user_id: Uuid) -> Result<()> {
        if self.users.iter().any(|u| u.id == user_id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("user {}", user_id)))
        }
    }

    fn username(&self, user_id: Uuid) -> String {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn view(&self, post: &Post) -> PostView {
        let group = post.group_id.and_then(|group_id| {
            self.groups
                .iter()
                .find(|g| g.id == group_id)
                .map(|g| GroupRef {
                    slug: g.slug.clone(),
                    title: g.title.clone(),
                })
        });

        PostView {
            id: post.id,
            text: post.text.clone(),
            image: post.image.clone(),
            pub_date: post.pub_date,
            author_id: post.author_id,
            author: self.username(post.author_id),
            group,
        }
    }

    fn matching_posts(&self, filter: &PostFilter) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.iter().filter(|p| filter.matches(p)).collect();
        posts.sort_by_key(|p| Reverse((p.pub_date, p.id)));
        posts
    }
}

/// In-process content store.
///
/// Holds everything behind a single lock, so each operation is atomic with
/// respect to the others. Used by the HTTP tests and `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryContentStore {
    state: RwLock<MemoryState>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryContentStore {
    async fn create_user(&self, username: &str) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.username == username) {
            return Err(AppError::Conflict(format!("user {} already exists", username)));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group> {
        let mut state = self.state.write().await;
        if state.groups.iter().any(|g| g.slug == group.slug) {
            return Err(AppError::Conflict(format!(
                "group {} already exists",
                group.slug
            )));
        }

        let group = Group {
            id: state.next_id(),
            slug: group.slug.clone(),
            title: group.title.clone(),
            description: group.description.clone(),
        };
        state.groups.push(group.clone());
        Ok(group)
    }

    async fn find_group_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.iter().find(|g| g.id == group_id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn create_post(&self, author_id: Uuid, post: &NewPost) -> Result<Post> {
        let mut state = self.state.write().await;
        state.require_user(author_id)?;
        if let Some(group_id) = post.group_id {
            if !state.groups.iter().any(|g| g.id == group_id) {
                return Err(AppError::NotFound(format!("group {}", group_id)));
            }
        }

        let post = Post {
            id: state.next_id(),
            author_id,
            group_id: post.group_id,
            text: post.text.clone(),
            image: post.image.clone(),
            pub_date: state.next_pub_date(),
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, post_id: i64, edit: &EditPost) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) else {
            return Ok(None);
        };

        post.text = edit.text.clone();
        post.group_id = edit.group_id;
        post.image = edit.image.clone();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.posts.len();
        state.posts.retain(|p| p.id != post_id);
        let removed = state.posts.len() < before;
        if removed {
            state.comments.retain(|c| c.post_id != post_id);
        }
        Ok(removed)
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        let state = self.state.read().await;
        Ok(state.posts.iter().find(|p| p.id == post_id).cloned())
    }

    async fn find_post_view(&self, post_id: i64) -> Result<Option<PostView>> {
        let state = self.state.read().await;
        Ok(state
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| state.view(p)))
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state.posts.iter().filter(|p| filter.matches(p)).count())
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostView>> {
        let state = self.state.read().await;
        Ok(state
            .matching_posts(filter)
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|p| state.view(p))
            .collect())
    }

    async fn create_comment(&self, post_id: i64, author_id: Uuid, text: &str) -> Result<Comment> {
        let mut state = self.state.write().await;
        if !state.posts.iter().any(|p| p.id == post_id) {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }
        state.require_user(author_id)?;

        let comment = Comment {
            id: state.next_id(),
            post_id,
            author_id,
            text: text.to_string(),
            created: Utc::now(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| CommentView {
                id: c.id,
                text: c.text.clone(),
                created: c.created,
                author_id: c.author_id,
                author: state.username(c.author_id),
            })
            .collect())
    }

    async fn insert_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        state.require_user(user_id)?;
        state.require_user(author_id)?;
        if state
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok(false);
        }

        let follow = Follow {
            id: state.next_id(),
            user_id,
            author_id,
            created_at: Utc::now(),
        };
        state.follows.push(follow);
        Ok(true)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.follows.len();
        state
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(state.follows.len() < before)
    }

    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn list_follows(&self, user_id: Uuid) -> Result<Vec<Follow>> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }
}
