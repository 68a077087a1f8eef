//! Maps an HTTP exchange onto the renderer, independent of any server crate.

use crate::{CardRenderer, Engine, Error, RenderRequest, RenderedCard};
use log::error;
use serde_json::json;

/// Top-level label of the 500 error envelope
pub const GENERATION_FAILED: &str = "Failed to generate ID card";

/// A fully formed HTTP response
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type", "text/plain; charset=utf-8".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    /// 200 with the card as a download.
    pub fn pdf(card: RenderedCard) -> Self {
        Self {
            status: 200,
            headers: vec![
                ("Content-Type", "application/pdf".to_string()),
                ("Content-Disposition", card.content_disposition()),
            ],
            body: card.bytes,
        }
    }

    /// Error reply: plain text for caller mistakes, JSON envelope otherwise.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::MethodNotAllowed => {
                let mut reply = Self::text(405, "Method Not Allowed");
                reply.headers.push(("Allow", "POST".to_string()));
                reply
            }
            Error::MissingContent => Self::text(400, "Missing HTML content"),
            Error::BodyRead(_) => Self::text(400, "Bad Request"),
            Error::PayloadTooLarge(_) => Self::text(413, "Payload Too Large"),
            other => {
                let body = json!({
                    "error": GENERATION_FAILED,
                    "details": other.to_string(),
                });
                Self {
                    status: other.status_code(),
                    headers: vec![("Content-Type", "application/json".to_string())],
                    body: body.to_string().into_bytes(),
                }
            }
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The card endpoint: validate, render, respond
pub struct CardHandler<E: Engine> {
    renderer: CardRenderer<E>,
}

impl<E: Engine> CardHandler<E> {
    pub fn new(renderer: CardRenderer<E>) -> Self {
        Self { renderer }
    }

    /// Largest body the endpoint will read.
    pub fn max_body_bytes(&self) -> usize {
        self.renderer.config().max_body_bytes
    }

    /// Handle one request. Input errors are answered before any browser is
    /// launched.
    pub fn handle(&self, method: &str, content_type: Option<&str>, body: &[u8]) -> Reply {
        match self.process(method, content_type, body) {
            Ok(card) => Reply::pdf(card),
            Err(e) => {
                if !e.is_client_error() {
                    error!("Generation Error: {}", e);
                }
                Reply::from_error(&e)
            }
        }
    }

    fn process(&self, method: &str, content_type: Option<&str>, body: &[u8]) -> crate::Result<RenderedCard> {
        if method != "POST" {
            return Err(Error::MethodNotAllowed);
        }
        if body.len() > self.max_body_bytes() {
            return Err(Error::PayloadTooLarge(self.max_body_bytes()));
        }
        let request = RenderRequest::from_body(content_type, body)?;
        self.renderer.render(&request.html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Failure, MockEngine, FAKE_PDF};
    use crate::RenderConfig;

    fn handler(engine: MockEngine) -> CardHandler<MockEngine> {
        CardHandler::new(CardRenderer::new(engine, RenderConfig::default()))
    }

    const JSON: Option<&str> = Some("application/json");

    #[test]
    fn non_post_is_405_regardless_of_body() {
        let engine = MockEngine::healthy();
        let stats = engine.stats();
        let h = handler(engine);
        for method in ["GET", "PUT", "DELETE", "PATCH", "OPTIONS", "HEAD", "post"] {
            let reply = h.handle(method, JSON, br#"{"html":"<p>x</p>"}"#);
            assert_eq!(reply.status, 405, "{method}");
            assert_eq!(reply.body, b"Method Not Allowed");
            assert_eq!(reply.header("allow"), Some("POST"));
        }
        assert_eq!(stats.launched(), 0);
    }

    #[test]
    fn missing_html_is_400_without_launching() {
        let engine = MockEngine::healthy();
        let stats = engine.stats();
        let h = handler(engine);
        let bodies: [&[u8]; 4] = [b"{}", br#"{"html":""}"#, br#"{"html":null}"#, b""];
        for body in bodies {
            let reply = h.handle("POST", JSON, body);
            assert_eq!(reply.status, 400);
            assert_eq!(reply.body, b"Missing HTML content");
        }
        assert_eq!(stats.launched(), 0);
    }

    #[test]
    fn oversized_body_is_413() {
        let engine = MockEngine::healthy();
        let stats = engine.stats();
        let config = RenderConfig {
            max_body_bytes: 16,
            ..Default::default()
        };
        let h = CardHandler::new(CardRenderer::new(engine, config));
        let reply = h.handle("POST", JSON, br#"{"html":"<div>far too long</div>"}"#);
        assert_eq!(reply.status, 413);
        assert_eq!(stats.launched(), 0);
    }

    #[test]
    fn unreadable_body_is_plain_400() {
        let reply = Reply::from_error(&Error::BodyRead("connection reset".into()));
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body, b"Bad Request");
        assert_eq!(reply.header("Content-Type"), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn success_returns_pdf_download() {
        let reply = handler(MockEngine::healthy()).handle("POST", JSON, br#"{"html":"<p>x</p>"}"#);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.header("Content-Type"), Some("application/pdf"));
        assert_eq!(
            reply.header("Content-Disposition"),
            Some("attachment; filename=\"VLSI_ID_Card.pdf\"")
        );
        assert_eq!(reply.body, FAKE_PDF);
    }

    #[test]
    fn engine_failures_are_500_json() {
        for failure in [Failure::Launch, Failure::Viewport, Failure::ContentTimeout, Failure::Pdf] {
            let engine = MockEngine::failing(failure);
            let stats = engine.stats();
            let reply = handler(engine).handle("POST", JSON, br#"{"html":"<p>x</p>"}"#);
            assert_eq!(reply.status, 500);
            assert_eq!(reply.header("Content-Type"), Some("application/json"));

            let body: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
            assert_eq!(body["error"], GENERATION_FAILED);
            assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
            assert_eq!(stats.launched(), stats.closed(), "{failure:?} leaked a session");
        }
    }

    #[test]
    fn timeout_details_carry_the_underlying_message() {
        let reply = handler(MockEngine::failing(Failure::ContentTimeout))
            .handle("POST", JSON, br#"{"html":"<p>x</p>"}"#);
        let body: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(body["details"], "Content load timed out after 10000ms");
    }
}
