use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use streamgate_core::Principal;

/// The caller, as placed in the request extensions by an authentication layer.
///
/// Requests that no such layer touched are anonymous.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(
            parts
                .extensions
                .get::<Principal>()
                .cloned()
                .unwrap_or_else(Principal::anonymous),
        ))
    }
}
