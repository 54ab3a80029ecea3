/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};

use super::{post_url, profile_url, redirect};
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::models::{EditPost, NewComment, NewPost};
use crate::services::{CommentOutcome, DeleteOutcome, EditOutcome};
use crate::AppState;

pub async fn post_detail(
    post_id: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let detail = state.posts.post_detail(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Create a new post, then show the author's profile
pub async fn post_create(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    req: web::Json<NewPost>,
) -> Result<HttpResponse> {
    let author = state.directory.user(user.0).await?;
    state
        .posts
        .create_post(user.viewer(), req.into_inner())
        .await?;

    Ok(redirect(&profile_url(&author.username)))
}

/// Edit a post; anyone but the author is sent home
pub async fn post_edit(
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
    state: web::Data<AppState>,
    req: web::Json<EditPost>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    match state
        .posts
        .edit_post(user.viewer(), post_id, req.into_inner())
        .await?
    {
        EditOutcome::Updated(_) => Ok(redirect(&post_url(post_id))),
        EditOutcome::NotAuthor => Ok(redirect("/")),
    }
}

pub async fn add_comment(
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
    state: web::Data<AppState>,
    req: web::Json<NewComment>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let outcome = state
        .posts
        .add_comment(user.viewer(), post_id, req.into_inner())
        .await?;

    if let CommentOutcome::Rejected(fields) = outcome {
        tracing::debug!(post_id, ?fields, "Comment not stored");
    }
    Ok(redirect(&post_url(post_id)))
}

pub async fn post_delete(
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    match state
        .posts
        .delete_post(user.viewer(), post_id.into_inner())
        .await?
    {
        DeleteOutcome::Deleted(_) => {
            let author = state.directory.user(user.0).await?;
            Ok(redirect(&profile_url(&author.username)))
        }
        DeleteOutcome::NotAuthor => Ok(redirect("/")),
    }
}
