/// Feed handlers - index, group, profile and follow pages
use actix_web::{http::header::ContentType, web, HttpRequest, HttpResponse};
use tracing::{debug, warn};

use super::PageQuery;
use crate::cache::page_key;
use crate::error::Result;
use crate::metrics::PAGE_CACHE_EVENTS;
use crate::middleware::AuthenticatedUser;
use crate::models::Viewer;
use crate::AppState;

const CACHE_STATUS_HEADER: &str = "X-Page-Cache";

/// Global feed. Served from the page cache while the entry is fresh.
pub async fn index(
    req: HttpRequest,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let key = page_key(req.path(), req.query_string());

    match state.page_cache.get(&key).await {
        Ok(Some(body)) => {
            PAGE_CACHE_EVENTS.with_label_values(&["hit"]).inc();
            debug!(%key, "Page cache HIT");
            return Ok(HttpResponse::Ok()
                .content_type(ContentType::json())
                .insert_header((CACHE_STATUS_HEADER, "hit"))
                .body(body));
        }
        Ok(None) => {
            PAGE_CACHE_EVENTS.with_label_values(&["miss"]).inc();
        }
        Err(err) => {
            PAGE_CACHE_EVENTS.with_label_values(&["error"]).inc();
            warn!(%key, "page cache read failed: {}", err);
        }
    }

    let page = state.feed.global_feed(query.page.as_deref()).await?;
    let body = serde_json::to_string(&page)?;

    if let Err(err) = state.page_cache.set(&key, &body).await {
        PAGE_CACHE_EVENTS.with_label_values(&["error"]).inc();
        warn!(%key, "page cache write failed: {}", err);
    }

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .insert_header((CACHE_STATUS_HEADER, "miss"))
        .body(body))
}

pub async fn group_posts(
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let feed = state
        .feed
        .group_feed(&slug.into_inner(), query.page.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(feed))
}

pub async fn profile(
    username: web::Path<String>,
    query: web::Query<PageQuery>,
    viewer: Viewer,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let feed = state
        .feed
        .author_feed(&username.into_inner(), viewer, query.page.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(feed))
}

/// Posts of the authors the current user follows
pub async fn follow_index(
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let page = state
        .feed
        .followed_feed(user.0, query.page.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}
