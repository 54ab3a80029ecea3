/// HTTP middleware utilities for blog-service
///
/// `ViewerMiddleware` resolves the optional bearer token of every request
/// into a [`Viewer`]. Handlers then pick the extractor they need:
/// `Viewer` for pages open to everyone, [`AuthenticatedUser`] for pages that
/// send anonymous visitors to the login flow.
pub mod jwt;

pub use jwt::{Claims, JwtKeys};

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Viewer;

/// Actix middleware that attaches a [`Viewer`] to request extensions.
///
/// A missing, malformed or invalid token yields `Viewer::Anonymous`; it never
/// rejects the request.
pub struct ViewerMiddleware {
    keys: Arc<JwtKeys>,
}

impl ViewerMiddleware {
    pub fn new(keys: Arc<JwtKeys>) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ViewerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ViewerMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ViewerMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct ViewerMiddlewareService<S> {
    service: Rc<S>,
    keys: Arc<JwtKeys>,
}

impl<S, B> Service<ServiceRequest> for ViewerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        let viewer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .and_then(|token| self.keys.verify(token.trim()))
            .map(Viewer::User)
            .unwrap_or(Viewer::Anonymous);

        req.extensions_mut().insert(viewer);

        Box::pin(async move { service.call(req).await })
    }
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<Viewer>()
            .copied()
            .unwrap_or_default()))
    }
}

/// Viewer that is known to be logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl AuthenticatedUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::User(self.0)
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let viewer = req.extensions().get::<Viewer>().copied().unwrap_or_default();

        let result = match viewer {
            Viewer::User(user_id) => Ok(AuthenticatedUser(user_id)),
            Viewer::Anonymous => {
                let next = match req.uri().query() {
                    Some(query) if !query.is_empty() => format!("{}?{}", req.path(), query),
                    _ => req.path().to_string(),
                };
                Err(AppError::LoginRequired { next }.into())
            }
        };

        ready(result)
    }
}
