/// Directory handlers - signup and group creation
use actix_web::{web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use super::redirect;
use crate::error::Result;
use crate::middleware::{AuthenticatedUser, JwtKeys};
use crate::models::{NewGroup, NewUser};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

/// Register a user and hand back a bearer token for it
pub async fn signup(
    state: web::Data<AppState>,
    keys: web::Data<JwtKeys>,
    req: web::Json<NewUser>,
) -> Result<HttpResponse> {
    let user = state.directory.register_user(&req.into_inner()).await?;
    let token = keys.issue_session(user.id)?;

    Ok(HttpResponse::Created().json(SignupResponse {
        id: user.id,
        username: user.username,
        token,
    }))
}

pub async fn group_create(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
    req: web::Json<NewGroup>,
) -> Result<HttpResponse> {
    let group = state.directory.create_group(&req.into_inner()).await?;
    Ok(redirect(&format!("/group/{}/", urlencoding::encode(&group.slug))))
}
