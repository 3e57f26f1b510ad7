//! Upstream response interception.
//!
//! # Responsibilities
//! - Gate on Content-Type: only `text/html` bodies are rewritten
//! - Wrap HTML bodies in the streaming banner injector
//! - Pass every other response through unchanged and unbuffered
//!
//! # Design Decisions
//! - A missing Content-Type means there is nothing to rewrite (redirects,
//!   204s); a malformed one is terminal for the response, never guessed at
//! - A rewritten body no longer matches the upstream Content-Length, so
//!   that header is dropped on the rewrite path only
//! - The injector owns the upstream body stream; dropping it releases the
//!   connection on every path, including mid-body errors and client
//!   disconnects

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, HttpBody};
use axum::http::{header, Response};
use bytes::Bytes;
use futures_util::Stream;
use thiserror::Error;

use crate::rewrite::{Banner, BodyScanner};

/// Terminal failure while preparing a response rewrite.
#[derive(Debug, Error)]
pub enum InterceptError {
    #[error("Content-Type header is not readable text")]
    ContentTypeEncoding,
    #[error("invalid media type in Content-Type header: {0}")]
    MediaType(#[from] mime::FromStrError),
}

/// Inspect an upstream response; HTML bodies come back wrapped in the
/// streaming banner injector, everything else passes through untouched.
pub fn intercept<B>(
    response: Response<B>,
    banner: &Banner,
) -> Result<Response<Body>, InterceptError>
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    let (mut parts, body) = response.into_parts();

    // No Content-Type, no body semantics of interest: redirects, 204s.
    let Some(value) = parts.headers.get(header::CONTENT_TYPE) else {
        return Ok(Response::from_parts(parts, Body::new(body)));
    };
    let value = value
        .to_str()
        .map_err(|_| InterceptError::ContentTypeEncoding)?;
    let media_type: mime::Mime = value.parse()?;

    if media_type.essence_str() != mime::TEXT_HTML.essence_str() {
        // Non-HTML payloads stream through untokenized and unbuffered.
        return Ok(Response::from_parts(parts, Body::new(body)));
    }

    // The rewritten body will not match the upstream's framing.
    parts.headers.remove(header::CONTENT_LENGTH);

    let scanner = BodyScanner::new(banner.bytes());
    let stream = BannerStream::new(Body::new(body).into_data_stream(), scanner);
    Ok(Response::from_parts(parts, Body::from_stream(stream)))
}

/// Streaming banner injector.
///
/// Scans chunks as they arrive until the scanner finds the injection point,
/// then hands off to a plain passthrough of the inner stream. A mid-body
/// error is forwarded and ends the stream; the engine aborts the response
/// rather than completing it.
struct BannerStream<S> {
    inner: S,
    scanner: Option<BodyScanner>,
    done: bool,
}

impl<S> BannerStream<S> {
    fn new(inner: S, scanner: BodyScanner) -> Self {
        Self {
            inner,
            scanner: Some(scanner),
            done: false,
        }
    }
}

impl<S, E> Stream for BannerStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.done {
                return Poll::Ready(None);
            }
            let Some(scanner) = this.scanner.as_mut() else {
                // COPYING: chunks pass through without touching the scanner.
                return Pin::new(&mut this.inner).poll_next(cx);
            };
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    let out = scanner.push(&chunk);
                    if scanner.pass_through() {
                        this.scanner = None;
                    }
                    if !out.is_empty() {
                        return Poll::Ready(Some(Ok(out)));
                    }
                    // Mid-token: nothing to emit yet, poll for more input.
                }
                Poll::Ready(Some(Err(e))) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.done = true;
                    let tail = scanner.finish();
                    this.scanner = None;
                    if !tail.is_empty() {
                        return Poll::Ready(Some(Ok(tail)));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use futures_util::stream;
    use http_body_util::BodyExt;

    fn banner() -> Banner {
        Banner::build("Production", "red")
    }

    fn banner_text() -> String {
        String::from_utf8(banner().bytes().to_vec()).unwrap()
    }

    async fn collect(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn html_response(body: &'static str) -> Response<Body> {
        Response::builder()
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_html_body_gets_banner() {
        let response = html_response(r#"<html><body class="x">hi</body></html>"#);
        let rewritten = intercept(response, &banner()).unwrap();

        // Content-Type survives, the stale Content-Length does not.
        assert_eq!(
            rewritten.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert!(rewritten.headers().get(header::CONTENT_LENGTH).is_none());

        let expected = format!(
            r#"<html><body class="x">{}hi</body></html>"#,
            banner_text()
        );
        assert_eq!(collect(rewritten).await, expected);
    }

    #[tokio::test]
    async fn test_html_split_across_chunks() {
        let chunks: Vec<Result<Bytes, axum::Error>> = vec![
            Ok(Bytes::from_static(b"<html><bo")),
            Ok(Bytes::from_static(b"dy cla")),
            Ok(Bytes::from_static(b"ss=\"x\">hi</body></html>")),
        ];
        let response = Response::builder()
            .header(header::CONTENT_TYPE, "text/html")
            .body(Body::from_stream(stream::iter(chunks)))
            .unwrap();

        let rewritten = intercept(response, &banner()).unwrap();
        let expected = format!(
            r#"<html><body class="x">{}hi</body></html>"#,
            banner_text()
        );
        assert_eq!(collect(rewritten).await, expected);
    }

    #[tokio::test]
    async fn test_html_without_body_tag_unchanged() {
        let response = html_response("<html><p>hi</p></html>");
        let rewritten = intercept(response, &banner()).unwrap();
        assert_eq!(collect(rewritten).await, "<html><p>hi</p></html>");
    }

    #[tokio::test]
    async fn test_json_passes_through_with_headers_intact() {
        let response = Response::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, 7)
            .body(Body::from(r#"{"a":1}"#))
            .unwrap();

        let rewritten = intercept(response, &banner()).unwrap();
        assert_eq!(
            rewritten.headers()[header::CONTENT_LENGTH],
            HeaderValue::from(7)
        );
        assert_eq!(collect(rewritten).await, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_missing_content_type_passes_through() {
        let response = Response::builder()
            .status(302)
            .header(header::LOCATION, "http://example.com/next")
            .body(Body::empty())
            .unwrap();

        let rewritten = intercept(response, &banner()).unwrap();
        assert_eq!(rewritten.status(), 302);
        assert_eq!(
            rewritten.headers()[header::LOCATION],
            "http://example.com/next"
        );
        assert_eq!(collect(rewritten).await, "");
    }

    #[tokio::test]
    async fn test_malformed_content_type_is_terminal() {
        let response = Response::builder()
            .header(header::CONTENT_TYPE, "not a media type")
            .body(Body::from("<body>"))
            .unwrap();

        let err = intercept(response, &banner()).unwrap_err();
        assert!(matches!(err, InterceptError::MediaType(_)));
    }
}
