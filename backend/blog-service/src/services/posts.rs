/// Post service - handles post creation, editing, detail, comments and removal
use crate::error::{AppError, FieldErrors, Result};
use crate::models::{Comment, EditPost, NewComment, NewPost, Post, PostDetail, Viewer};
use crate::services::require_user;
use crate::store::{ContentStore, PostFilter};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

/// Result of an edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Updated(Post),
    /// The viewer does not own the post; nothing changed.
    NotAuthor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Post),
    NotAuthor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    Created(Comment),
    /// Invalid comment; nothing stored.
    Rejected(FieldErrors),
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn ContentStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Create a post authored by the viewer
    pub async fn create_post(&self, viewer: Viewer, new_post: NewPost) -> Result<Post> {
        let author_id = require_user(viewer)?;
        self.check_form(&new_post, new_post.group_id).await?;

        let new_post = NewPost {
            text: new_post.text.trim().to_string(),
            ..new_post
        };
        let post = self.store.create_post(author_id, &new_post).await?;

        info!(post_id = post.id, %author_id, "Post created");
        Ok(post)
    }

    /// Replace text, group and image of a post owned by the viewer
    pub async fn edit_post(
        &self,
        viewer: Viewer,
        post_id: i64,
        edit: EditPost,
    ) -> Result<EditOutcome> {
        let user_id = require_user(viewer)?;
        let post = self.get_post(post_id).await?;
        if post.author_id != user_id {
            debug!(post_id, %user_id, "Edit by non-author ignored");
            return Ok(EditOutcome::NotAuthor);
        }

        self.check_form(&edit, edit.group_id).await?;

        let edit = EditPost {
            text: edit.text.trim().to_string(),
            ..edit
        };
        let updated = self
            .store
            .update_post(post_id, &edit)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        info!(post_id, "Post updated");
        Ok(EditOutcome::Updated(updated))
    }

    /// Post with its author's post count and comments
    pub async fn post_detail(&self, post_id: i64) -> Result<PostDetail> {
        let post = self
            .store
            .find_post_view(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        let author_post_count = self
            .store
            .count_posts(&PostFilter::Author(post.author_id))
            .await?;
        let comments = self.store.list_comments(post_id).await?;

        Ok(PostDetail {
            post,
            author_post_count,
            comments,
        })
    }

    pub async fn add_comment(
        &self,
        viewer: Viewer,
        post_id: i64,
        comment: NewComment,
    ) -> Result<CommentOutcome> {
        let author_id = require_user(viewer)?;
        self.get_post(post_id).await?;

        if let Err(errors) = comment.validate() {
            debug!(post_id, "Blank comment rejected");
            return Ok(CommentOutcome::Rejected(errors.into()));
        }

        let comment = self
            .store
            .create_comment(post_id, author_id, comment.text.trim())
            .await?;
        info!(post_id, comment_id = comment.id, "Comment added");
        Ok(CommentOutcome::Created(comment))
    }

    pub async fn delete_post(&self, viewer: Viewer, post_id: i64) -> Result<DeleteOutcome> {
        let user_id = require_user(viewer)?;
        let post = self.get_post(post_id).await?;
        if post.author_id != user_id {
            return Ok(DeleteOutcome::NotAuthor);
        }

        if !self.store.delete_post(post_id).await? {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        info!(post_id, "Post deleted");
        Ok(DeleteOutcome::Deleted(post))
    }

    async fn get_post(&self, post_id: i64) -> Result<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
    }

    /// Field validation plus the existence of the selected group.
    async fn check_form(&self, form: &impl Validate, group_id: Option<i64>) -> Result<()> {
        let mut errors = match form.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        if let Some(group_id) = group_id {
            if self.store.find_group_by_id(group_id).await?.is_none() {
                errors.add("group", "Select a valid choice.");
            }
        }

        errors.into_result()
    }
}
