use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Hardening headers for the JSON API.
///
/// Download responses carry user content, so they additionally get a sandbox
/// CSP that keeps a served HTML file from running script in our origin.
pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let is_download = req.uri().path().starts_with("/api/download/");

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("same-origin"),
    );

    let csp = if is_download {
        "default-src 'none'; sandbox"
    } else {
        "default-src 'none'; frame-ancestors 'none'"
    };
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static(csp),
    );

    response
}
