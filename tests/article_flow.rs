use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt;

use webook::application::ports::rate_limiter::RateLimiter;
use webook::application::services::articles::ArticleError;
use webook::bootstrap::app_context::AppContext;
use webook::bootstrap::config::Config;
use webook::domain::articles::article::{Article, ArticleStatus};
use webook::infrastructure::memory::rate_limiter::MemorySlidingWindowLimiter;
use webook::presentation::http::auth::Claims;

fn context() -> AppContext {
    AppContext::in_memory(Config::default())
}

#[tokio::test]
async fn published_copy_tracks_the_latest_sync() {
    let ctx = context();
    let articles = ctx.articles();
    let id = articles
        .publish(Article::new_draft(1, "v1", "first"))
        .await
        .unwrap();
    assert_eq!(articles.get_pub(id).await.unwrap().title, "v1");
    ctx.tasks().drain().await;

    let next = Article {
        id,
        ..Article::new_draft(1, "v2", "second")
    };
    assert_eq!(articles.publish(next).await.unwrap(), id);
    ctx.tasks().drain().await;

    let published = articles.get_pub(id).await.unwrap();
    let draft = articles.get_draft(id).await.unwrap();
    assert_eq!(published.title, "v2");
    assert_eq!(published.content, "second");
    assert_eq!(draft.title, published.title);
    assert_eq!(draft.content, published.content);
    assert_eq!(draft.status, ArticleStatus::Published);
}

#[tokio::test]
async fn withdrawn_article_leaves_the_published_path() {
    let ctx = context();
    let articles = ctx.articles();
    let id = articles
        .publish(Article::new_draft(3, "t", "c"))
        .await
        .unwrap();
    articles.get_pub(id).await.unwrap();
    ctx.tasks().drain().await;

    articles.withdraw(id, 3).await.unwrap();
    ctx.tasks().drain().await;

    assert!(matches!(
        articles.get_pub(id).await,
        Err(ArticleError::NotFound)
    ));
    let draft = articles.get_draft(id).await.unwrap();
    assert_eq!(draft.status, ArticleStatus::Private);

    let unpublished = articles
        .save(Article::new_draft(3, "draft", "c"))
        .await
        .unwrap();
    assert!(matches!(
        articles.withdraw(unpublished, 3).await,
        Err(ArticleError::InvalidStatus)
    ));

    assert!(matches!(
        articles.withdraw(id, 4).await,
        Err(ArticleError::NotOwned)
    ));
}

#[tokio::test]
async fn like_counts_once_per_user() {
    let ctx = context();
    let counters = ctx.interactions();
    let before = counters
        .get_interactive_info(1, "article", 77)
        .await
        .unwrap()
        .like_cnt;

    counters.like(1, "article", 77).await.unwrap();
    counters.like(1, "article", 77).await.unwrap();
    let liked = counters.get_interactive_info(1, "article", 77).await.unwrap();
    assert_eq!(liked.like_cnt, before + 1);
    ctx.tasks().drain().await;

    counters.cancel_like(1, "article", 77).await.unwrap();
    ctx.tasks().drain().await;
    let after = counters.get_interactive_info(1, "article", 77).await.unwrap();
    assert_eq!(after.like_cnt, before);

    counters.cancel_like(2, "article", 77).await.unwrap();
    ctx.tasks().drain().await;
    let unchanged = counters.get_interactive_info(2, "article", 77).await.unwrap();
    assert_eq!(unchanged.like_cnt, before);
}

#[tokio::test]
async fn deep_offset_bypasses_the_first_page_cache() {
    let ctx = context();
    let articles = ctx.articles();
    let mut ids = Vec::new();
    for n in 0..160 {
        let id = articles
            .save(Article::new_draft(9, format!("draft {n}"), "body"))
            .await
            .unwrap();
        ids.push(id);
    }
    ctx.tasks().drain().await;

    let page = articles.list_author_draft(9, 10, 150).await.unwrap();
    let got: Vec<i64> = page.iter().map(|a| a.id).collect();
    let expected: Vec<i64> = ids[..10].iter().rev().copied().collect();
    assert_eq!(got, expected);

    let first = articles.list_author_draft(9, 100, 0).await.unwrap();
    assert_eq!(first.len(), 100);
    assert_eq!(first[0].id, ids[159]);
}

#[tokio::test(start_paused = true)]
async fn limiter_admits_three_per_second() {
    let limiter = MemorySlidingWindowLimiter::new(Duration::from_secs(1), 3);
    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(limiter.allow("article_write:1").await.unwrap());
    }
    assert_eq!(seen, vec![true, true, true, false]);
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(limiter.allow("article_write:1").await.unwrap());
}

#[tokio::test]
async fn saved_draft_round_trips() {
    let ctx = context();
    let articles = ctx.articles();
    let id = articles
        .save(Article::new_draft(5, "T", "C"))
        .await
        .unwrap();
    let draft = articles.get_draft(id).await.unwrap();
    assert_eq!(draft.title, "T");
    assert_eq!(draft.content, "C");
    assert_eq!(draft.status, ArticleStatus::Unpublished);
    assert_eq!(draft.author_id, 5);
}

// --- HTTP surface ---

fn bearer(cfg: &Config, uid: i64) -> String {
    let claims = Claims {
        sub: uid.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

async fn call(
    app: &axum::Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        req = req.header("authorization", auth);
    }
    let req = match body {
        Some(body) => req
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn http_publish_read_like_withdraw() {
    let cfg = Config::default();
    let ctx = AppContext::in_memory(cfg.clone());
    let app = webook::presentation::http::api_router(ctx.clone(), None);
    let author = bearer(&cfg, 11);
    let reader = bearer(&cfg, 12);

    let (status, _) = call(&app, "GET", "/api/articles/drafts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        "POST",
        "/api/articles/edit",
        Some(&author),
        Some(json!({ "title": "hello", "content": "world" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        "GET",
        &format!("/api/articles/drafts/{id}"),
        Some(&reader),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "GET", &format!("/api/articles/pub/{id}"), Some(&reader), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        "POST",
        "/api/articles/publish",
        Some(&author),
        Some(json!({ "id": id, "title": "hello", "content": "world!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_i64(), Some(id));

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/articles/{id}/like"),
        Some(&reader),
        Some(json!({ "like": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(&app, "GET", &format!("/api/articles/pub/{id}"), Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["article"]["content"], "world!");
    assert_eq!(body["like_cnt"], 1);
    assert_eq!(body["liked"], true);
    assert_eq!(body["collected"], false);

    let (status, body) = call(&app, "GET", "/api/authors/11/articles", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));

    let (status, _) = call(
        &app,
        "POST",
        "/api/articles/withdraw",
        Some(&reader),
        Some(json!({ "id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        "POST",
        "/api/articles/withdraw",
        Some(&author),
        Some(json!({ "id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    ctx.tasks().drain().await;

    let (status, _) = call(&app, "GET", &format!("/api/articles/pub/{id}"), Some(&reader), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, "GET", "/api/articles/drafts?offset=-1", Some(&author), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_write_limit_answers_429() {
    let mut cfg = Config::default();
    cfg.article_write_rate.max_requests = 2;
    let ctx = AppContext::in_memory(cfg.clone());
    let app = webook::presentation::http::api_router(ctx, None);
    let author = bearer(&cfg, 21);

    let mut statuses = Vec::new();
    for n in 0..3 {
        let (status, _) = call(
            &app,
            "POST",
            "/api/articles/edit",
            Some(&author),
            Some(json!({ "title": format!("t{n}"), "content": "c" })),
        )
        .await;
        statuses.push(status);
    }
    assert_eq!(
        statuses,
        vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );

    // Another author has a window of their own.
    let (status, _) = call(
        &app,
        "POST",
        "/api/articles/edit",
        Some(&bearer(&cfg, 22)),
        Some(json!({ "title": "t", "content": "c" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn http_ingress_limit_answers_429() {
    let mut cfg = Config::default();
    cfg.ingress_rate.max_requests = 1;
    let app = webook::presentation::http::api_router(AppContext::in_memory(cfg), None);

    let (first, body) = call(&app, "GET", "/api/health", None, None).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (second, _) = call(&app, "GET", "/api/health", None, None).await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
}
