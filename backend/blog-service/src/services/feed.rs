/// Feed composition for the index, group, profile and follow views
use crate::error::{AppError, Result};
use crate::metrics::{FEED_REQUEST_DURATION_SECONDS, FEED_REQUEST_TOTAL};
use crate::models::{Group, PostView, ProfileView, Viewer};
use crate::pagination::{Page, Paginator};
use crate::services::follow::FollowGraph;
use crate::store::{ContentStore, PostFilter};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedView {
    Index,
    Group,
    Profile,
    Follow,
}

impl FeedView {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedView::Index => "index",
            FeedView::Group => "group",
            FeedView::Profile => "profile",
            FeedView::Follow => "follow",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<PostView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorFeed {
    pub profile: ProfileView,
    pub page: Page<PostView>,
}

#[derive(Clone)]
pub struct FeedComposer {
    store: Arc<dyn ContentStore>,
    follows: FollowGraph,
    paginator: Paginator,
}

impl FeedComposer {
    pub fn new(store: Arc<dyn ContentStore>, paginator: Paginator) -> Self {
        Self {
            follows: FollowGraph::new(store.clone()),
            store,
            paginator,
        }
    }

    /// All posts, newest first.
    pub async fn global_feed(&self, page: Option<&str>) -> Result<Page<PostView>> {
        self.compose(FeedView::Index, &PostFilter::All, page).await
    }

    /// Posts of the group with `slug`; NotFound for an unknown slug.
    pub async fn group_feed(&self, slug: &str, page: Option<&str>) -> Result<GroupFeed> {
        let group = self
            .store
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group {}", slug)))?;

        let page = self
            .compose(FeedView::Group, &PostFilter::Group(group.id), page)
            .await?;

        Ok(GroupFeed { group, page })
    }

    /// Posts of `username` plus the profile header seen by `viewer`.
    pub async fn author_feed(
        &self,
        username: &str,
        viewer: Viewer,
        page: Option<&str>,
    ) -> Result<AuthorFeed> {
        let author = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", username)))?;

        let page = self
            .compose(FeedView::Profile, &PostFilter::Author(author.id), page)
            .await?;

        let following = match viewer.user_id() {
            Some(viewer_id) => self.follows.is_following(viewer_id, author.id).await?,
            None => false,
        };

        Ok(AuthorFeed {
            profile: ProfileView {
                post_count: page.count,
                author,
                following,
            },
            page,
        })
    }

    /// Posts by authors `viewer_id` follows. Empty when they follow nobody.
    pub async fn followed_feed(
        &self,
        viewer_id: Uuid,
        page: Option<&str>,
    ) -> Result<Page<PostView>> {
        let authors = self.follows.following_ids(viewer_id).await?;
        if authors.is_empty() {
            FEED_REQUEST_TOTAL
                .with_label_values(&[FeedView::Follow.as_str()])
                .inc();
            let window = self.paginator.resolve(page, 0);
            return Ok(Page::new(window, Vec::new()));
        }

        self.compose(FeedView::Follow, &PostFilter::Authors(authors), page)
            .await
    }

    async fn compose(
        &self,
        view: FeedView,
        filter: &PostFilter,
        raw_page: Option<&str>,
    ) -> Result<Page<PostView>> {
        FEED_REQUEST_TOTAL.with_label_values(&[view.as_str()]).inc();
        let _timer = FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&[view.as_str()])
            .start_timer();

        let count = self.store.count_posts(filter).await?;
        let window = self.paginator.resolve(raw_page, count);
        let items = if window.is_empty() {
            Vec::new()
        } else {
            self.store
                .list_posts(filter, window.per_page, window.offset())
                .await?
        };

        debug!(
            view = view.as_str(),
            count,
            page = window.number,
            items = items.len(),
            "Feed composed"
        );
        Ok(Page::new(window, items))
    }
}
