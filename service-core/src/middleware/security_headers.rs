use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::IntoResponse,
};

const SWAGGER_CSP: &str = "default-src 'self'; \
     script-src 'self' 'unsafe-inline'; \
     style-src 'self' 'unsafe-inline'; \
     img-src 'self' data:; \
     font-src 'self'; \
     connect-src 'self'";

const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";

fn is_swagger_path(path: &str) -> bool {
    path.starts_with("/docs") || path == "/openapi.json"
}

fn apply_security_headers(headers: &mut HeaderMap, swagger: bool) {
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );

    if swagger {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(SWAGGER_CSP),
        );
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    } else {
        headers.insert(header::CONTENT_SECURITY_POLICY, HeaderValue::from_static(API_CSP));
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        // API responses may carry signed tokens or credentials.
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }
}

pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let swagger = is_swagger_path(req.uri().path());

    let mut response = next.run(req).await;
    apply_security_headers(response.headers_mut(), swagger);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_routes_are_not_cacheable() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers, false);

        assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    }

    #[test]
    fn swagger_routes_allow_same_origin_framing() {
        assert!(is_swagger_path("/docs/index.html"));
        assert!(is_swagger_path("/openapi.json"));
        assert!(!is_swagger_path("/tokens"));

        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers, true);
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "SAMEORIGIN");
        assert!(headers.get(header::CACHE_CONTROL).is_none());
    }
}
