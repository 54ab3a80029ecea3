/// Blog Service Library
///
/// A small social blog: users publish posts, optionally into groups, comment
/// on them and follow other authors to get a personal feed.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `models`: Rows, read models and validated write payloads
/// - `services`: Feed composition, follow graph, posts, users and groups
/// - `store`: Content store trait with PostgreSQL and in-memory backends
/// - `pagination`: Page-number pagination of feeds
/// - `cache`: Page cache for the index feed
/// - `middleware`: Viewer resolution from bearer tokens
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};

use cache::PageCache;
use pagination::Paginator;
use services::{Directory, FeedComposer, FollowGraph, PostService};
use std::sync::Arc;
use store::ContentStore;

/// Shared state handed to every handler through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub page_cache: Arc<dyn PageCache>,
    pub feed: FeedComposer,
    pub follows: FollowGraph,
    pub posts: PostService,
    pub directory: Directory,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ContentStore>,
        page_cache: Arc<dyn PageCache>,
        paginator: Paginator,
    ) -> Self {
        Self {
            feed: FeedComposer::new(store.clone(), paginator),
            follows: FollowGraph::new(store.clone()),
            posts: PostService::new(store.clone()),
            directory: Directory::new(store.clone()),
            store,
            page_cache,
        }
    }
}
