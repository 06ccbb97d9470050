//! Actor context and per-group role checks.
//!
//! The upstream auth layer authenticates the caller and forwards the result
//! as trusted headers. [`RoleGuardLayer`] parses them once per request,
//! rejects roles the route group does not serve, and hands the [`Actor`] to
//! handlers through request extensions.

use crate::domain::error::ApiError;
use axum::{
    body::Body,
    http::{HeaderMap, Request},
    response::{IntoResponse, Response},
};
use shared_types::{Actor, ParseEnumError, Role};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, warn, Span};

pub const HEADER_ACTOR_ID: &str = "x-actor-id";
pub const HEADER_ACTOR_NAME: &str = "x-actor-name";
pub const HEADER_ACTOR_ROLE: &str = "x-actor-role";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .ok_or_else(|| ApiError::unauthenticated(format!("Missing {} header", name)))?
        .to_str()
        .map(str::trim)
        .map_err(|_| ApiError::unauthenticated(format!("Malformed {} header", name)))
}

/// Parse the actor headers. Any missing or malformed header is a 401.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let id: u64 = header(headers, HEADER_ACTOR_ID)?
        .parse()
        .map_err(|_| ApiError::unauthenticated(format!("Malformed {} header", HEADER_ACTOR_ID)))?;
    let role: Role = header(headers, HEADER_ACTOR_ROLE)?
        .parse()
        .map_err(|e: ParseEnumError| ApiError::unauthenticated(e.to_string()))?;
    let name = header(headers, HEADER_ACTOR_NAME)?;
    if name.is_empty() {
        return Err(ApiError::unauthenticated(format!(
            "Empty {} header",
            HEADER_ACTOR_NAME
        )));
    }

    Ok(Actor::new(id, name, role))
}

/// Admits only actors whose role is in `roles`.
#[derive(Clone)]
pub struct RoleGuardLayer {
    roles: &'static [Role],
}

impl RoleGuardLayer {
    pub fn new(roles: &'static [Role]) -> Self {
        Self { roles }
    }
}

impl<S> Layer<S> for RoleGuardLayer {
    type Service = RoleGuardService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RoleGuardService {
            inner,
            roles: self.roles,
        }
    }
}

#[derive(Clone)]
pub struct RoleGuardService<S> {
    inner: S,
    roles: &'static [Role],
}

impl<S> Service<Request<Body>> for RoleGuardService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        let actor = match actor_from_headers(req.headers()) {
            Ok(actor) => actor,
            Err(err) => {
                warn!(
                    path = %req.uri().path(),
                    error = %err.message,
                    "Rejected request without actor"
                );
                return Box::pin(async move { Ok(err.into_response()) });
            }
        };

        Span::current().record("actor.role", actor.role.as_str());

        if !self.roles.contains(&actor.role) {
            warn!(
                actor_id = actor.id,
                role = %actor.role,
                path = %req.uri().path(),
                "Role not allowed on route"
            );
            let err = ApiError::forbidden(format!(
                "Role {} may not use {}",
                actor.role,
                req.uri().path()
            ));
            return Box::pin(async move { Ok(err.into_response()) });
        }

        debug!(actor_id = actor.id, role = %actor.role, "Actor admitted");
        req.extensions_mut().insert(actor);
        Box::pin(async move { inner.call(req).await })
    }
}
