//! services/api/src/web/middleware.rs
//!
//! Learner identity middleware for protecting routes.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use uuid::Uuid;

/// Middleware that extracts the learner identity from the `x-learner-id`
/// header, as asserted by the authenticating gateway in front of this
/// service.
///
/// If present and well-formed, inserts the learner id into request extensions
/// for handlers to use. Otherwise returns 401 Unauthorized.
pub async fn require_learner(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    // 1. Extract the identity header
    let learner_id_str = req
        .headers()
        .get("x-learner-id")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Parse it as a UUID
    let learner_id =
        Uuid::parse_str(learner_id_str).map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 3. Insert the learner id into request extensions
    req.extensions_mut().insert(learner_id);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
