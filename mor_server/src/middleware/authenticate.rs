//! Authentication middleware.
//!
//! Requests must carry an `Authorization: Bearer <token>` header. The token is resolved into a user by the identity
//! service via [`ExternalGateway::validate_authorization`], and the resulting [`Principal`] is stored in the request
//! extensions. Handlers pick it up with `web::ReqData<Principal>`.
//!
//! A missing, malformed or rejected token yields a 401 response and the request goes no further.
use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::future::{ok, Ready};
use log::*;
use mor_engine::{gateway::ExternalGateway, Principal};

use crate::errors::{AuthError, ServerError};

const BEARER: &str = "bearer ";

/// Extracts the token from an `Authorization` header value. The scheme is matched case-insensitively.
pub fn bearer_token(header: Option<&str>) -> Result<String, AuthError> {
    let header = header.map(str::trim).filter(|h| !h.is_empty()).ok_or(AuthError::MissingToken)?;
    match header.get(..BEARER.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(BEARER) => Ok(header[BEARER.len()..].trim().to_string()),
        _ => Err(AuthError::InvalidToken("expected a bearer token".into())),
    }
}

pub struct AuthenticationMiddlewareFactory<G> {
    gateway: Rc<G>,
}

impl<G> AuthenticationMiddlewareFactory<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway: Rc::new(gateway) }
    }
}

impl<S, B, G> Transform<S, ServiceRequest> for AuthenticationMiddlewareFactory<G>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    G: ExternalGateway + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AuthenticationMiddlewareService<S, G>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthenticationMiddlewareService { gateway: Rc::clone(&self.gateway), service: Rc::new(service) })
    }
}

pub struct AuthenticationMiddlewareService<S, G> {
    gateway: Rc<G>,
    service: Rc<S>,
}

impl<S, B, G> Service<ServiceRequest> for AuthenticationMiddlewareService<S, G>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    G: ExternalGateway + 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gateway = Rc::clone(&self.gateway);
        let header = req.headers().get(AUTHORIZATION).map(|v| v.to_str().map(String::from));
        Box::pin(async move {
            let header = header.transpose().map_err(|e| {
                ServerError::AuthenticationError(AuthError::InvalidToken(format!("unreadable header. {e}")))
            })?;
            let token = bearer_token(header.as_deref()).map_err(ServerError::AuthenticationError)?;
            let user = gateway.validate_authorization(&token).await.map_err(|e| {
                debug!("💻️ Bearer token for {} was rejected. {e}", req.path());
                ServerError::AuthenticationError(AuthError::InvalidToken(e.to_string()))
            })?;
            let principal = Principal::from(user);
            trace!("💻️ Request to {} authenticated as account {}", req.path(), principal.account_id);
            req.extensions_mut().insert(principal);
            service.call(req).await
        })
    }
}
