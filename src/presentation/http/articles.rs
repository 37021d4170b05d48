use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::application::services::articles::ArticleError;
use crate::application::use_cases::articles::edit::EditArticle;
use crate::application::use_cases::articles::get_draft::GetDraft;
use crate::application::use_cases::articles::list_drafts::ListDrafts;
use crate::application::use_cases::articles::list_published::ListPublished;
use crate::application::use_cases::articles::publish::PublishArticle;
use crate::application::use_cases::articles::read_article::ReadArticle;
use crate::application::use_cases::articles::withdraw::WithdrawArticle;
use crate::bootstrap::app_context::AppContext;
use crate::domain::articles::article::Article;
use crate::presentation::http::auth::{self, Bearer};

const MAX_PAGE_LIMIT: i64 = 1000;

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleItem {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    /// 1 unpublished, 2 published, 3 private.
    pub status: u8,
    pub create_time: i64,
    pub update_time: i64,
}

impl From<Article> for ArticleItem {
    fn from(a: Article) -> Self {
        Self {
            id: a.id,
            title: a.title,
            content: a.content,
            author_id: a.author_id,
            status: a.status.as_u8(),
            create_time: a.create_time,
            update_time: a.update_time,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleListResponse {
    pub items: Vec<ArticleItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleDetailResponse {
    pub article: ArticleItem,
    pub read_cnt: i64,
    pub like_cnt: i64,
    pub collect_cnt: i64,
    pub liked: bool,
    pub collected: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EditArticleRequest {
    /// Omit (or 0) to create a new draft.
    #[serde(default)]
    pub id: i64,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawArticleRequest {
    pub id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleIdResponse {
    pub id: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    fn resolve(&self) -> Result<(i64, i64), StatusCode> {
        let limit = self.limit.unwrap_or(10);
        let offset = self.offset.unwrap_or(0);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) || offset < 0 {
            return Err(StatusCode::BAD_REQUEST);
        }
        Ok((limit, offset))
    }
}

pub(crate) fn article_error_status(err: ArticleError) -> StatusCode {
    match err {
        ArticleError::NotFound => StatusCode::NOT_FOUND,
        ArticleError::NotOwned => StatusCode::FORBIDDEN,
        ArticleError::InvalidStatus => StatusCode::BAD_REQUEST,
        ArticleError::Throttled => StatusCode::TOO_MANY_REQUESTS,
        ArticleError::Storage(err) => {
            tracing::error!(error = ?err, "article_request_failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[utoipa::path(post, path = "/api/articles/edit", tag = "Articles",
    request_body = EditArticleRequest,
    responses((status = 200, body = ArticleIdResponse)))]
pub async fn edit_article(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Json(req): Json<EditArticleRequest>,
) -> Result<Json<ArticleIdResponse>, StatusCode> {
    let uid = auth::validate_bearer(&ctx.cfg, bearer)?;
    let limiter = ctx.write_limiter();
    let uc = EditArticle {
        articles: ctx.articles(),
        limiter: limiter.as_ref(),
    };
    let id = uc
        .execute(uid, req.id, req.title, req.content)
        .await
        .map_err(article_error_status)?;
    Ok(Json(ArticleIdResponse { id }))
}

#[utoipa::path(post, path = "/api/articles/publish", tag = "Articles",
    request_body = EditArticleRequest,
    responses((status = 200, body = ArticleIdResponse)))]
pub async fn publish_article(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Json(req): Json<EditArticleRequest>,
) -> Result<Json<ArticleIdResponse>, StatusCode> {
    let uid = auth::validate_bearer(&ctx.cfg, bearer)?;
    let limiter = ctx.write_limiter();
    let uc = PublishArticle {
        articles: ctx.articles(),
        limiter: limiter.as_ref(),
    };
    let id = uc
        .execute(uid, req.id, req.title, req.content)
        .await
        .map_err(article_error_status)?;
    Ok(Json(ArticleIdResponse { id }))
}

#[utoipa::path(post, path = "/api/articles/withdraw", tag = "Articles",
    request_body = WithdrawArticleRequest,
    responses((status = 204)))]
pub async fn withdraw_article(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Json(req): Json<WithdrawArticleRequest>,
) -> Result<StatusCode, StatusCode> {
    let uid = auth::validate_bearer(&ctx.cfg, bearer)?;
    let limiter = ctx.write_limiter();
    let uc = WithdrawArticle {
        articles: ctx.articles(),
        limiter: limiter.as_ref(),
    };
    uc.execute(uid, req.id)
        .await
        .map_err(article_error_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/articles/drafts", tag = "Articles",
    params(PageQuery),
    responses((status = 200, body = ArticleListResponse)))]
pub async fn list_drafts(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Query(q): Query<PageQuery>,
) -> Result<Json<ArticleListResponse>, StatusCode> {
    let uid = auth::validate_bearer(&ctx.cfg, bearer)?;
    let (limit, offset) = q.resolve()?;
    let uc = ListDrafts {
        articles: ctx.articles(),
    };
    let items = uc
        .execute(uid, limit, offset)
        .await
        .map_err(article_error_status)?
        .into_iter()
        .map(ArticleItem::from)
        .collect();
    Ok(Json(ArticleListResponse { items }))
}

#[utoipa::path(get, path = "/api/articles/drafts/{id}", tag = "Articles",
    params(("id" = i64, Path, description = "Draft id")),
    responses((status = 200, body = ArticleItem)))]
pub async fn get_draft(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Path(id): Path<i64>,
) -> Result<Json<ArticleItem>, StatusCode> {
    let uid = auth::validate_bearer(&ctx.cfg, bearer)?;
    let uc = GetDraft {
        articles: ctx.articles(),
    };
    let article = uc.execute(uid, id).await.map_err(article_error_status)?;
    Ok(Json(article.into()))
}

#[utoipa::path(get, path = "/api/articles/pub/{id}", tag = "Articles",
    params(("id" = i64, Path, description = "Article id")),
    responses((status = 200, body = ArticleDetailResponse)))]
pub async fn read_article(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Path(id): Path<i64>,
) -> Result<Json<ArticleDetailResponse>, StatusCode> {
    let uid = auth::validate_bearer(&ctx.cfg, bearer)?;
    let uc = ReadArticle {
        articles: ctx.articles(),
        interactions: ctx.interactions(),
        biz: &ctx.cfg.interactive_biz,
    };
    let detail = uc.execute(uid, id).await.map_err(article_error_status)?;
    let counters = detail.interactive;
    Ok(Json(ArticleDetailResponse {
        article: detail.article.into(),
        read_cnt: counters.read_cnt,
        like_cnt: counters.like_cnt,
        collect_cnt: counters.collect_cnt,
        liked: counters.liked,
        collected: counters.collected,
    }))
}

#[utoipa::path(get, path = "/api/authors/{uid}/articles", tag = "Articles",
    params(("uid" = i64, Path, description = "Author id"), PageQuery),
    responses((status = 200, body = ArticleListResponse)))]
pub async fn list_author_articles(
    State(ctx): State<AppContext>,
    Path(author_id): Path<i64>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ArticleListResponse>, StatusCode> {
    let (limit, offset) = q.resolve()?;
    let uc = ListPublished {
        articles: ctx.articles(),
    };
    let items = uc
        .execute(author_id, limit, offset)
        .await
        .map_err(article_error_status)?
        .into_iter()
        .map(ArticleItem::from)
        .collect();
    Ok(Json(ArticleListResponse { items }))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/articles/edit", post(edit_article))
        .route("/articles/publish", post(publish_article))
        .route("/articles/withdraw", post(withdraw_article))
        .route("/articles/drafts", get(list_drafts))
        .route("/articles/drafts/:id", get(get_draft))
        .route("/articles/pub/:id", get(read_article))
        .route("/authors/:uid/articles", get(list_author_articles))
        .with_state(ctx)
}
