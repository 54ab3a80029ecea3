//! HTTP scenario tests against the in-memory backends.
//!
//! Coverage:
//! - Pagination of the index, group and profile pages
//! - Group isolation
//! - Index page cache staleness and explicit clearing
//! - Follow feed visibility
//! - Login redirects, author-only editing, 404 fallback
//! - Signup tokens, group creation, unknown-user tokens

use actix_web::{http::header, http::StatusCode, test, web, App};
use blog_service::cache::MemoryPageCache;
use blog_service::handlers::{configure_routes, not_found};
use blog_service::middleware::{JwtKeys, ViewerMiddleware};
use blog_service::models::{Group, NewGroup, NewPost, Post, User};
use blog_service::pagination::Paginator;
use blog_service::store::{ContentStore, MemoryContentStore, PostFilter};
use blog_service::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const SECRET: &str = "http-scenarios-secret-0123456789abcdef";

struct Ctx {
    state: web::Data<AppState>,
    store: Arc<dyn ContentStore>,
    keys: Arc<JwtKeys>,
}

impl Ctx {
    fn new() -> Self {
        let store: Arc<dyn ContentStore> = Arc::new(MemoryContentStore::new());
        let cache = Arc::new(MemoryPageCache::new(Duration::from_secs(20)));
        let state = AppState::new(store.clone(), cache, Paginator::default());

        Self {
            state: web::Data::new(state),
            store,
            keys: Arc::new(JwtKeys::from_secret(SECRET)),
        }
    }

    async fn user(&self, username: &str) -> (User, String) {
        let user = self.store.create_user(username).await.unwrap();
        let token = self.keys.issue(user.id, 3600).unwrap();
        (user, format!("Bearer {}", token))
    }

    async fn group(&self, slug: &str) -> Group {
        self.store
            .create_group(&NewGroup {
                slug: slug.to_string(),
                title: format!("Group {}", slug),
                description: String::new(),
            })
            .await
            .unwrap()
    }

    async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.store
            .create_post(
                author.id,
                &NewPost {
                    text: text.to_string(),
                    group_id: group.map(|g| g.id),
                    image: None,
                },
            )
            .await
            .unwrap()
    }
}

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data($ctx.state.clone())
                .app_data(web::Data::from($ctx.keys.clone()))
                .wrap(ViewerMiddleware::new($ctx.keys.clone()))
                .configure(configure_routes)
                .default_service(web::to(not_found)),
        )
        .await
    };
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn texts(items: &Value) -> Vec<String> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["text"].as_str().unwrap().to_string())
        .collect()
}

#[actix_web::test]
async fn test_thirteen_posts_split_across_two_pages() {
    let ctx = Ctx::new();
    let (author, _) = ctx.user("author").await;
    let group = ctx.group("test-slug").await;
    for i in 0..13 {
        ctx.post(&author, &format!("post {}", i), Some(&group)).await;
    }
    let app = init_app!(ctx);

    for (first, second) in [
        ("/", "/?page=2"),
        ("/group/test-slug/", "/group/test-slug/?page=2"),
        ("/profile/author/", "/profile/author/?page=2"),
    ] {
        let page1: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri(first).to_request(),
        )
        .await;
        let page2: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri(second).to_request(),
        )
        .await;

        let (page1, page2) = if first == "/" {
            (page1, page2)
        } else {
            (page1["page"].clone(), page2["page"].clone())
        };

        assert_eq!(page1["items"].as_array().unwrap().len(), 10, "{}", first);
        assert_eq!(page2["items"].as_array().unwrap().len(), 3, "{}", second);
        assert_eq!(page1["items"][0]["text"], "post 12");
        assert_eq!(page2["has_next"], false);
    }
}

#[actix_web::test]
async fn test_profile_reports_post_count() {
    let ctx = Ctx::new();
    let (author, _) = ctx.user("author").await;
    ctx.post(&author, "one", None).await;
    ctx.post(&author, "two", None).await;
    let app = init_app!(ctx);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/profile/author/").to_request(),
    )
    .await;
    assert_eq!(body["profile"]["post_count"], 2);
    assert_eq!(body["profile"]["author"]["username"], "author");
    assert_eq!(body["profile"]["following"], false);
}

#[actix_web::test]
async fn test_group_page_only_lists_its_posts() {
    let ctx = Ctx::new();
    let (author, token) = ctx.user("author").await;
    let cats = ctx.group("cats").await;
    let dogs = ctx.group("dogs").await;
    ctx.post(&author, "old dog post", Some(&dogs)).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header((header::AUTHORIZATION, token))
        .set_json(json!({ "text": "new cat post", "group_id": cats.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/author/");

    let cats_page: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/group/cats/").to_request(),
    )
    .await;
    assert_eq!(texts(&cats_page["page"]["items"]), vec!["new cat post"]);
    assert_eq!(cats_page["page"]["items"][0]["group"]["slug"], "cats");

    let dogs_page: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/group/dogs/").to_request(),
    )
    .await;
    assert_eq!(texts(&dogs_page["page"]["items"]), vec!["old dog post"]);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/group/birds/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_index_is_cached_until_cleared() {
    let ctx = Ctx::new();
    let (author, token) = ctx.user("author").await;
    let post = ctx.post(&author, "soon deleted", None).await;
    let app = init_app!(ctx);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.headers().get("X-Page-Cache").unwrap(), "miss");
    let before: Value = test::read_body_json(resp).await;
    assert_eq!(texts(&before["items"]), vec!["soon deleted"]);

    assert!(ctx.store.delete_post(post.id).await.unwrap());
    assert_eq!(ctx.store.count_posts(&PostFilter::All).await.unwrap(), 0);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.headers().get("X-Page-Cache").unwrap(), "hit");
    let stale: Value = test::read_body_json(resp).await;
    assert_eq!(stale, before);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/cache/clear")
            .insert_header((header::AUTHORIZATION, token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let fresh: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert!(fresh["items"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_follow_feed_shows_followed_authors_only() {
    let ctx = Ctx::new();
    let (_, token_a) = ctx.user("a").await;
    let (_, token_b) = ctx.user("b").await;
    let (_, token_c) = ctx.user("c").await;
    let app = init_app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/profile/b/follow/")
            .insert_header((header::AUTHORIZATION, token_a.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/b/");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .insert_header((header::AUTHORIZATION, token_b))
            .set_json(json!({ "text": "hello followers" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let a_feed: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/follow/")
            .insert_header((header::AUTHORIZATION, token_a.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(texts(&a_feed["items"]), vec!["hello followers"]);

    let c_feed: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/follow/")
            .insert_header((header::AUTHORIZATION, token_c))
            .to_request(),
    )
    .await;
    assert!(c_feed["items"].as_array().unwrap().is_empty());

    let profile: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/profile/b/")
            .insert_header((header::AUTHORIZATION, token_a))
            .to_request(),
    )
    .await;
    assert_eq!(profile["profile"]["following"], true);
}

#[actix_web::test]
async fn test_follow_is_idempotent_and_unfollow_requires_edge() {
    let ctx = Ctx::new();
    let (a, token_a) = ctx.user("a").await;
    let (b, _) = ctx.user("b").await;
    let app = init_app!(ctx);

    for _ in 0..2 {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/profile/b/follow/")
                .insert_header((header::AUTHORIZATION, token_a.clone()))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }
    assert_eq!(ctx.store.list_follows(a.id).await.unwrap().len(), 1);

    // Following yourself is silently ignored.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/profile/a/follow/")
            .insert_header((header::AUTHORIZATION, token_a.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(!ctx.store.follow_exists(a.id, a.id).await.unwrap());

    for expected in [StatusCode::FOUND, StatusCode::NOT_FOUND] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/profile/b/unfollow/")
                .insert_header((header::AUTHORIZATION, token_a.clone()))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), expected);
    }
    assert!(!ctx.store.follow_exists(a.id, b.id).await.unwrap());
}

#[actix_web::test]
async fn test_anonymous_writes_redirect_to_login() {
    let ctx = Ctx::new();
    let (author, _) = ctx.user("author").await;
    let post = ctx.post(&author, "text", None).await;
    let app = init_app!(ctx);

    let comment_path = format!("/posts/{}/comment/", post.id);
    let edit_path = format!("/posts/{}/edit/", post.id);
    let delete_path = format!("/posts/{}/delete/", post.id);
    let cases = [
        test::TestRequest::post()
            .uri("/create/")
            .set_json(json!({ "text": "anon" })),
        test::TestRequest::post()
            .uri(&comment_path)
            .set_json(json!({ "text": "anon" })),
        test::TestRequest::post()
            .uri(&edit_path)
            .set_json(json!({ "text": "anon edit" })),
        test::TestRequest::post().uri(&delete_path),
        test::TestRequest::post().uri("/profile/author/follow/"),
        test::TestRequest::post().uri("/profile/author/unfollow/"),
        test::TestRequest::get().uri("/follow/"),
    ];
    let expected = [
        "/auth/login/?next=/create/".to_string(),
        format!("/auth/login/?next={}", comment_path),
        format!("/auth/login/?next={}", edit_path),
        format!("/auth/login/?next={}", delete_path),
        "/auth/login/?next=/profile/author/follow/".to_string(),
        "/auth/login/?next=/profile/author/unfollow/".to_string(),
        "/auth/login/?next=/follow/".to_string(),
    ];

    for (req, expected) in cases.into_iter().zip(expected) {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), expected);
    }

    assert_eq!(ctx.store.count_posts(&PostFilter::All).await.unwrap(), 1);
    assert!(ctx.store.list_comments(post.id).await.unwrap().is_empty());
    let stored = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "text");
}

#[actix_web::test]
async fn test_only_author_can_edit() {
    let ctx = Ctx::new();
    let (author, author_token) = ctx.user("author").await;
    let (_, other_token) = ctx.user("other").await;
    let post = ctx.post(&author, "first draft", None).await;
    let app = init_app!(ctx);
    let edit_path = format!("/posts/{}/edit/", post.id);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&edit_path)
            .insert_header((header::AUTHORIZATION, other_token))
            .set_json(json!({ "text": "hijacked" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    assert_eq!(
        ctx.store.find_post(post.id).await.unwrap().unwrap().text,
        "first draft"
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&edit_path)
            .insert_header((header::AUTHORIZATION, author_token))
            .set_json(json!({ "text": "edited" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(
        ctx.store.find_post(post.id).await.unwrap().unwrap().text,
        "edited"
    );
}

#[actix_web::test]
async fn test_create_with_blank_text_is_rejected() {
    let ctx = Ctx::new();
    let (_, token) = ctx.user("author").await;
    let app = init_app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .insert_header((header::AUTHORIZATION, token))
            .set_json(json!({ "text": "   " }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]["text"].is_array());
    assert_eq!(ctx.store.count_posts(&PostFilter::All).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_post_detail_lists_comments() {
    let ctx = Ctx::new();
    let (author, _) = ctx.user("author").await;
    let (_, reader_token) = ctx.user("reader").await;
    let post = ctx.post(&author, "discuss", None).await;
    let app = init_app!(ctx);
    let comment_path = format!("/posts/{}/comment/", post.id);

    for text in ["", "First!"] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&comment_path)
                .insert_header((header::AUTHORIZATION, reader_token.clone()))
                .set_json(json!({ "text": text }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    }

    let detail: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .to_request(),
    )
    .await;
    assert_eq!(detail["post"]["text"], "discuss");
    assert_eq!(detail["author_post_count"], 1);
    assert_eq!(texts(&detail["comments"]), vec!["First!"]);
    assert_eq!(detail["comments"][0]["author"], "reader");
}

#[actix_web::test]
async fn test_signup_token_can_create_group_and_post() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_json(json!({ "username": "newcomer" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "newcomer");
    let token = format!("Bearer {}", body["token"].as_str().unwrap());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_json(json!({ "username": "newcomer" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/groups/")
            .set_json(json!({ "slug": "rust", "title": "Rust" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/groups/");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/groups/")
            .insert_header((header::AUTHORIZATION, token.clone()))
            .set_json(json!({ "slug": "rust", "title": "Rust" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/group/rust/");

    let group = ctx.store.find_group_by_slug("rust").await.unwrap().unwrap();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .insert_header((header::AUTHORIZATION, token))
            .set_json(json!({ "text": "hello", "group_id": group.id }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/newcomer/");

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/group/rust/").to_request(),
    )
    .await;
    assert_eq!(body["page"]["count"], 1);
}

#[actix_web::test]
async fn test_follow_with_token_for_unknown_user_is_404() {
    let ctx = Ctx::new();
    ctx.user("author").await;
    let ghost = format!("Bearer {}", ctx.keys.issue(uuid::Uuid::new_v4(), 3600).unwrap());
    let app = init_app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/profile/author/follow/")
            .insert_header((header::AUTHORIZATION, ghost))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_unknown_path_is_json_404() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);

    for uri in ["/unexisting_page/", "/posts/999/"] {
        let resp =
            test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 404);
    }
}

#[actix_web::test]
async fn test_health_and_metrics() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/health").to_request(),
    )
    .await;
    assert_eq!(body["status"], "ok");

    test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("blog_feed_request_total"));
}
