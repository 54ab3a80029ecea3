/// Follow handlers - subscribe to and unsubscribe from an author
use actix_web::{web, HttpResponse};

use super::{profile_url, redirect};
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::AppState;

pub async fn profile_follow(
    user: AuthenticatedUser,
    username: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (author, _) = state
        .follows
        .follow_username(user.0, &username.into_inner())
        .await?;
    Ok(redirect(&profile_url(&author.username)))
}

/// Fails with 404 when the user does not follow the author
pub async fn profile_unfollow(
    user: AuthenticatedUser,
    username: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let author = state
        .follows
        .unfollow_username(user.0, &username.into_inner())
        .await?;
    Ok(redirect(&profile_url(&author.username)))
}
