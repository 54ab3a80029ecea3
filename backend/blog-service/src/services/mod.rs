/// Business logic layer for blog-service
///
/// Services are thin, store-agnostic orchestrators over a shared
/// [`ContentStore`](crate::store::ContentStore). Every operation receives the
/// acting [`Viewer`] explicitly.
pub mod directory;
pub mod feed;
pub mod follow;
pub mod posts;

pub use directory::Directory;
pub use feed::{AuthorFeed, FeedComposer, FeedView, GroupFeed};
pub use follow::{FollowGraph, FollowOutcome};
pub use posts::{CommentOutcome, DeleteOutcome, EditOutcome, PostService};

use crate::error::{AppError, Result};
use crate::models::Viewer;
use uuid::Uuid;

/// User id of a logged-in viewer; anonymous viewers are unauthorized.
pub(crate) fn require_user(viewer: Viewer) -> Result<Uuid> {
    viewer
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("login required".to_string()))
}
