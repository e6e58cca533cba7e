// HTTP response helper functions to reduce duplication across route handlers

use hyper::{Body, Response, StatusCode};

/// Standard CORS headers
const CORS_ORIGIN: &str = "*";
const CORS_METHODS: &str = "GET, POST, OPTIONS";
const CORS_HEADERS: &str = "content-type, authorization";

/// Build a JSON error response with a `detail` message
pub fn json_error(status: StatusCode, detail: &str) -> Response<Body> {
    let json = format!(r#"{{"detail":"{}"}}"#, detail.replace('"', "\\\""));
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("access-control-allow-origin", CORS_ORIGIN)
        .header("access-control-allow-methods", CORS_METHODS)
        .header("access-control-allow-headers", CORS_HEADERS)
        .body(Body::from(json))
        .unwrap()
}

/// Build a raw JSON string response
pub fn json_raw(status: StatusCode, json: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("access-control-allow-origin", CORS_ORIGIN)
        .header("access-control-allow-methods", CORS_METHODS)
        .header("access-control-allow-headers", CORS_HEADERS)
        .body(Body::from(json))
        .unwrap()
}

/// Build a binary TIFF download response
pub fn tiff_response(filename: &str, bytes: Vec<u8>) -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "image/tiff")
        .header(
            "content-disposition",
            format!("attachment; filename=\"{filename}\""),
        )
        .header("access-control-allow-origin", CORS_ORIGIN)
        .header("access-control-allow-methods", CORS_METHODS)
        .header("access-control-allow-headers", CORS_HEADERS)
        .body(Body::from(bytes))
        .unwrap()
}

/// Build an empty response with CORS headers
pub fn empty_response(status: StatusCode) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("access-control-allow-origin", CORS_ORIGIN)
        .header("access-control-allow-methods", CORS_METHODS)
        .header("access-control-allow-headers", CORS_HEADERS)
        .body(Body::empty())
        .unwrap()
}

/// CORS preflight response
pub fn cors_preflight() -> Response<Body> {
    empty_response(StatusCode::OK)
}
