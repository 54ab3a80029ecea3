//! Prometheus metrics for blog-service.
//!
//! Exposes feed, page cache and follow graph collectors and an HTTP handler
//! for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Feed requests by view (index, group, profile, follow).
    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_feed_request_total",
        "Total feed requests segmented by view",
        &["view"]
    )
    .expect("failed to register blog_feed_request_total");

    /// Duration of feed composition by view.
    pub static ref FEED_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "blog_feed_request_duration_seconds",
        "Feed composition duration segmented by view",
        &["view"]
    )
    .expect("failed to register blog_feed_request_duration_seconds");

    /// Page cache events (hit/miss/error).
    pub static ref PAGE_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "blog_page_cache_events_total",
        "Page cache events segmented by outcome",
        &["event"]
    )
    .expect("failed to register blog_page_cache_events_total");

    /// Follow graph mutations by outcome.
    pub static ref FOLLOW_MUTATIONS: IntCounterVec = register_int_counter_vec!(
        "blog_follow_mutations_total",
        "Follow and unfollow requests segmented by action and outcome",
        &["action", "outcome"]
    )
    .expect("failed to register blog_follow_mutations_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
