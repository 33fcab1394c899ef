/// CORS handling for browser consumers
///
/// Preflight requests are answered here with an empty 200 on any path; every
/// other response gets permissive headers attached on the way out. Public read
/// paths advertise the secret header and read verbs only; `/api` paths
/// advertise the bearer header and the write verbs used by management clients.

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "Content-Type, X-API-Secret";
pub const ALLOW_METHODS: &str = "GET, OPTIONS";

pub const MANAGEMENT_ALLOW_HEADERS: &str = "Content-Type, Authorization";
pub const MANAGEMENT_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

pub async fn cors(request: Request, next: Next) -> Response {
    let management = is_management_path(request.uri().path());

    if request.method() == Method::OPTIONS {
        tracing::debug!("✈️ Preflight for {}", request.uri().path());
        let mut response = StatusCode::OK.into_response();
        apply_cors_headers(response.headers_mut(), management);
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut(), management);
    response
}

fn is_management_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

fn apply_cors_headers(headers: &mut HeaderMap, management: bool) {
    let (allow_headers, allow_methods) = if management {
        (MANAGEMENT_ALLOW_HEADERS, MANAGEMENT_ALLOW_METHODS)
    } else {
        (ALLOW_HEADERS, ALLOW_METHODS)
    };

    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(allow_headers));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(allow_methods));
}
