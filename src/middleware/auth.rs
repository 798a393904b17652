use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{decode_jwt, Principal};
use crate::error::ApiError;

/// JWT authentication middleware that validates tokens and injects the
/// caller as a [`Principal`] extension.
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let claims = decode_jwt(token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized(e.to_string())
    })?;

    request.extensions_mut().insert(Principal::from(claims));
    Ok(next.run(request).await)
}

/// Admits staff principals only. Must run after [`jwt_auth_middleware`].
pub async fn require_staff_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !principal.is_staff {
        tracing::warn!("Non-staff user '{}' denied platform admin access", principal.username);
        return Err(ApiError::forbidden("Platform administrator access required"));
    }
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_str = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Empty JWT token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_jwt_from_headers(&headers), Err("Missing Authorization header"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  "));
        assert_eq!(extract_jwt_from_headers(&headers), Err("Empty JWT token"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers), Ok("abc.def.ghi"));
    }
}
