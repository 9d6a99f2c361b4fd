use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use clipseek_core::api::TenantId;

use super::models::{HttpServerError, TENANT_HEADER};

/// Tenant from the `x-tenant-id` header, or `default` when the header is absent.
pub fn tenant_from_headers(
    headers: &HeaderMap,
    default: &TenantId,
) -> Result<TenantId, HttpServerError> {
    match headers.get(TENANT_HEADER) {
        None => Ok(default.clone()),
        Some(value) => {
            let raw = value.to_str().map_err(|_| {
                HttpServerError::InvalidRequest(format!("{TENANT_HEADER} is not valid text"))
            })?;
            Ok(TenantId::parse(raw)?)
        }
    }
}

/// Malformed or incomplete JSON bodies are client errors.
pub fn json_rejection(rejection: JsonRejection) -> HttpServerError {
    HttpServerError::InvalidRequest(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_overrides_default_tenant() {
        let default = TenantId::parse("default").unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(tenant_from_headers(&headers, &default).unwrap(), default);

        headers.insert(TENANT_HEADER, HeaderValue::from_static("acme"));
        assert_eq!(
            tenant_from_headers(&headers, &default).unwrap().as_str(),
            "acme"
        );

        headers.insert(TENANT_HEADER, HeaderValue::from_static("../etc"));
        assert!(matches!(
            tenant_from_headers(&headers, &default),
            Err(HttpServerError::InvalidRequest(_))
        ));
    }
}
