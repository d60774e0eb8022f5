//! Line-framed streaming responses
//!
//! Each frame is written to the body as its own chunk, so the client sees
//! every delta as soon as the provider produces it.

use crate::relay::StreamFrame;
use axum::body::Body;
use axum::http::{header, HeaderName};
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt};
use std::convert::Infallible;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Wrap relay output in a streaming `text/plain` response
pub fn frame_response<S>(frames: S) -> Response
where
    S: Stream<Item = StreamFrame> + Send + 'static,
{
    let body = Body::from_stream(frames.map(|frame| Ok::<_, Infallible>(frame.encode())));
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            // Reverse proxies must not hold frames back
            (X_ACCEL_BUFFERING, "no"),
        ],
        body,
    )
        .into_response()
}
