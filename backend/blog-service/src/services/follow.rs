/// Follow graph service - directed user→author subscriptions
use crate::error::{AppError, Result};
use crate::metrics::FOLLOW_MUTATIONS;
use crate::models::User;
use crate::store::ContentStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Result of a follow request. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    SelfFollowIgnored,
}

impl FollowOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowOutcome::Created => "created",
            FollowOutcome::AlreadyFollowing => "already_following",
            FollowOutcome::SelfFollowIgnored => "self_follow_ignored",
        }
    }
}

#[derive(Clone)]
pub struct FollowGraph {
    store: Arc<dyn ContentStore>,
}

impl FollowGraph {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Make `follower_id` follow `author_id`. Idempotent.
    pub async fn follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<FollowOutcome> {
        let outcome = if follower_id == author_id {
            FollowOutcome::SelfFollowIgnored
        } else {
            self.ensure_user(author_id).await?;
            if self.store.insert_follow(follower_id, author_id).await? {
                info!(%follower_id, %author_id, "Follow created");
                FollowOutcome::Created
            } else {
                FollowOutcome::AlreadyFollowing
            }
        };

        debug!(%follower_id, %author_id, outcome = outcome.as_str(), "Follow request");
        FOLLOW_MUTATIONS
            .with_label_values(&["follow", outcome.as_str()])
            .inc();
        Ok(outcome)
    }

    /// Remove the edge `follower_id → author_id`; NotFound when absent.
    pub async fn unfollow(&self, follower_id: Uuid, author_id: Uuid) -> Result<()> {
        if !self.store.delete_follow(follower_id, author_id).await? {
            FOLLOW_MUTATIONS
                .with_label_values(&["unfollow", "not_found"])
                .inc();
            return Err(AppError::NotFound(format!(
                "follow {} -> {}",
                follower_id, author_id
            )));
        }

        info!(%follower_id, %author_id, "Follow removed");
        FOLLOW_MUTATIONS
            .with_label_values(&["unfollow", "removed"])
            .inc();
        Ok(())
    }

    pub async fn is_following(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool> {
        self.store.follow_exists(follower_id, author_id).await
    }

    /// Authors followed by `follower_id`.
    pub async fn following_ids(&self, follower_id: Uuid) -> Result<Vec<Uuid>> {
        let follows = self.store.list_follows(follower_id).await?;
        Ok(follows.into_iter().map(|f| f.author_id).collect())
    }

    pub async fn follow_username(
        &self,
        follower_id: Uuid,
        username: &str,
    ) -> Result<(User, FollowOutcome)> {
        let author = self.author_by_username(username).await?;
        let outcome = self.follow(follower_id, author.id).await?;
        Ok((author, outcome))
    }

    pub async fn unfollow_username(&self, follower_id: Uuid, username: &str) -> Result<User> {
        let author = self.author_by_username(username).await?;
        self.unfollow(follower_id, author.id).await?;
        Ok(author)
    }

    async fn author_by_username(&self, username: &str) -> Result<User> {
        self.store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", username)))
    }

    async fn ensure_user(&self, user_id: Uuid) -> Result<()> {
        match self.store.find_user_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("user {}", user_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryContentStore;

    async fn setup() -> (FollowGraph, Arc<dyn ContentStore>, User, User) {
        let store: Arc<dyn ContentStore> = Arc::new(MemoryContentStore::new());
        let follower = store.create_user("follower").await.unwrap();
        let author = store.create_user("author").await.unwrap();
        (FollowGraph::new(store.clone()), store, follower, author)
    }

    #[tokio::test]
    async fn test_follow_twice_creates_one_edge() {
        let (graph, store, follower, author) = setup().await;

        assert_eq!(
            graph.follow(follower.id, author.id).await.unwrap(),
            FollowOutcome::Created
        );
        assert_eq!(
            graph.follow(follower.id, author.id).await.unwrap(),
            FollowOutcome::AlreadyFollowing
        );
        assert_eq!(store.list_follows(follower.id).await.unwrap().len(), 1);
        assert!(graph.is_following(follower.id, author.id).await.unwrap());
        assert!(!graph.is_following(author.id, follower.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_self_follow_is_ignored() {
        let (graph, store, follower, _) = setup().await;

        assert_eq!(
            graph.follow(follower.id, follower.id).await.unwrap(),
            FollowOutcome::SelfFollowIgnored
        );
        assert!(store.list_follows(follower.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unfollow_without_edge_is_not_found() {
        let (graph, _, follower, author) = setup().await;

        assert!(matches!(
            graph.unfollow(follower.id, author.id).await,
            Err(AppError::NotFound(_))
        ));

        graph.follow(follower.id, author.id).await.unwrap();
        graph.unfollow(follower.id, author.id).await.unwrap();
        assert!(!graph.is_following(follower.id, author.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unfollow_only_removes_own_edge() {
        let (graph, store, follower, author) = setup().await;
        let other = store.create_user("other").await.unwrap();

        graph.follow(follower.id, author.id).await.unwrap();
        graph.follow(other.id, author.id).await.unwrap();
        graph.unfollow(follower.id, author.id).await.unwrap();

        assert!(graph.is_following(other.id, author.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_follows_produce_one_edge() {
        let (graph, store, follower, author) = setup().await;

        let attempts = (0..8).map(|_| graph.follow(follower.id, author.id));
        let outcomes = futures::future::join_all(attempts).await;

        let created = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(FollowOutcome::Created)))
            .count();
        assert_eq!(created, 1);
        assert_eq!(store.list_follows(follower.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_username_wrappers() {
        let (graph, _, follower, author) = setup().await;

        let (user, outcome) = graph
            .follow_username(follower.id, "author")
            .await
            .unwrap();
        assert_eq!(user.id, author.id);
        assert_eq!(outcome, FollowOutcome::Created);
        assert_eq!(graph.following_ids(follower.id).await.unwrap(), vec![author.id]);

        assert!(matches!(
            graph.follow_username(follower.id, "ghost").await,
            Err(AppError::NotFound(_))
        ));

        graph.unfollow_username(follower.id, "author").await.unwrap();
        assert!(graph.following_ids(follower.id).await.unwrap().is_empty());
    }
}
