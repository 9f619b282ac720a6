use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;
use uuid::Uuid;

use wpcauth_auth::{AuthFailure, FailureCause, Identity, RoutePolicy, VARY};
use wpcauth_core::RoutePath;

use crate::app::errors::ApiError;
use crate::app::AppState;
use crate::context::{CurrentUser, RequestRoute};
use crate::credentials::BAD_AUTH_HEADER_CODE;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Give every request a v7 request id, a span carrying it, and echo it back.
pub async fn request_span(req: Request, next: Next) -> Response {
    let request_id = Uuid::now_v7();
    let span = tracing::info_span!(
        "request",
        %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let mut response = next.run(req).instrument(span.clone()).await;
    span.in_scope(|| tracing::debug!(status = response.status().as_u16(), "request finished"));

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

/// Attach CORS and caching headers to every REST response, errors included.
pub async fn response_headers(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let route = route_of(&state, &req);
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let mut response = next.run(req).await;

    let decorations = state.policy.headers.decorate(&route, origin.as_deref());
    let headers = response.headers_mut();
    for (name, value) in decorations.iter() {
        let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) else {
            tracing::warn!(header = name, "skipping unrepresentable response header");
            continue;
        };
        if name.as_str().eq_ignore_ascii_case(VARY) {
            headers.append(name, value);
        } else {
            headers.insert(name, value);
        }
    }
    response
}

/// Resolve the bearer credential and run the route policy before any handler.
pub async fn access_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let route = route_of(&state, &req);
    req.extensions_mut().insert(RequestRoute::new(route.clone()));

    // Preflight carries no credentials.
    if req.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }

    let has_credential = req.headers().contains_key(header::AUTHORIZATION);
    let (identity, upstream) = authenticate(&state, req.headers()).await;

    let authorization_required = match &state.credentials {
        Some(layer) => layer.authorization_required_code(identity.is_some()),
        None => state.authorization_required,
    };

    let required = state.policy.routes.required_capability();
    let decision = state.policy.routes.evaluate(
        &route,
        has_credential,
        || identity.as_ref().is_some_and(|user| user.has_cap(required)),
        authorization_required.as_u16(),
    );

    if let Err(failure) = RoutePolicy::gate(decision, upstream) {
        return ApiError::Auth(failure).into_response();
    }

    if let Some(identity) = identity {
        req.extensions_mut().insert(CurrentUser::new(identity));
    }
    next.run(req).await
}

fn route_of(state: &AppState, req: &Request) -> RoutePath {
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path());
    state.policy.routes.route_for(target)
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> (Option<Identity>, Option<AuthFailure>) {
    if !headers.contains_key(header::AUTHORIZATION) {
        return (None, None);
    }

    let Some(layer) = &state.credentials else {
        tracing::warn!("bearer credential ignored: credential layer is not active");
        return (None, None);
    };

    let token = match extract_bearer(headers) {
        Ok(token) => token,
        Err(failure) => return (None, Some(failure)),
    };

    match layer.authenticate(token).await {
        Ok(identity) => {
            tracing::debug!(user_id = %identity.id(), "bearer credential accepted");
            (Some(identity), None)
        }
        Err(failure) => {
            tracing::info!(code = %failure.primary().code, "bearer credential rejected");
            (None, Some(failure))
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthFailure> {
    let bad_header = || {
        AuthFailure::new(FailureCause::new(
            BAD_AUTH_HEADER_CODE,
            "Authorization header malformed.",
            StatusCode::FORBIDDEN.as_u16(),
        ))
    };

    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(bad_header)?
        .to_str()
        .map_err(|_| bad_header())?;

    let token = header.strip_prefix("Bearer ").ok_or_else(bad_header)?.trim();
    if token.is_empty() {
        return Err(bad_header());
    }

    Ok(token)
}
