// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transparent zstd request decompression.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use confab_protocol::{error_code, ErrorBody, CONTENT_ENCODING_ZSTD};

/// Cap on a decompressed (or plain) request body.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Inflate `Content-Encoding: zstd` request bodies before extraction.
/// Plain bodies pass through untouched.
pub async fn decompress_request(req: Request, next: Next) -> Response {
    let is_zstd = req
        .headers()
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case(CONTENT_ENCODING_ZSTD));
    if !is_zstd {
        return next.run(req).await;
    }

    let (mut parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => return bad_request(format!("failed to read request body: {e}")),
    };
    let decoded = match zstd::decode_all(&bytes[..]) {
        Ok(d) => d,
        Err(e) => return bad_request(format!("invalid zstd body: {e}")),
    };

    parts.headers.remove(header::CONTENT_ENCODING);
    parts.headers.remove(header::CONTENT_LENGTH);
    next.run(Request::from_parts(parts, Body::from(decoded)))
        .await
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::new(error_code::PROTOCOL_MALFORMED, message)),
    )
        .into_response()
}
