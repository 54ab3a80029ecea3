/// HTTP handlers for blog endpoints
///
/// Reads render JSON; writes answer with a `302 Found` to the page the user
/// should see next.
pub mod directory;
pub mod feed;
pub mod follow;
pub mod health;
pub mod posts;

pub use directory::{group_create, signup};
pub use feed::{follow_index, group_posts, index, profile};
pub use follow::{profile_follow, profile_unfollow};
pub use health::health;
pub use posts::{add_comment, post_create, post_delete, post_detail, post_edit};

use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::metrics::serve_metrics;
use crate::middleware::AuthenticatedUser;
use crate::AppState;

/// `?page=` parameter accepted by every list route.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub(crate) fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

/// Drop every cached page
pub async fn cache_clear(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    state.page_cache.clear().await?;
    tracing::info!("Page cache cleared");
    Ok(HttpResponse::NoContent().finish())
}

/// Fallback for unknown paths
pub async fn not_found() -> Result<HttpResponse> {
    Err(AppError::NotFound("page".to_string()))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/auth/signup/", web::post().to(signup))
        .route("/groups/", web::post().to(group_create))
        .route("/group/{slug}/", web::get().to(group_posts))
        .route("/create/", web::post().to(post_create))
        .route("/follow/", web::get().to(follow_index))
        .route("/profile/{username}/", web::get().to(profile))
        .route("/profile/{username}/follow/", web::post().to(profile_follow))
        .route(
            "/profile/{username}/unfollow/",
            web::post().to(profile_unfollow),
        )
        .route("/posts/{post_id}/", web::get().to(post_detail))
        .route("/posts/{post_id}/edit/", web::post().to(post_edit))
        .route("/posts/{post_id}/comment/", web::post().to(add_comment))
        .route("/posts/{post_id}/delete/", web::post().to(post_delete))
        .route("/cache/clear", web::post().to(cache_clear))
        .route("/health", web::get().to(health))
        .route("/metrics", web::get().to(serve_metrics));
}
