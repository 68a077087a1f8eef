//! Render request parsing and validation

use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// A validated request to render one card
///
/// `html` is guaranteed to be non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub html: String,
}

#[derive(Deserialize)]
struct JsonBody {
    #[serde(default)]
    html: Option<Value>,
}

impl RenderRequest {
    /// Build a request from raw markup, rejecting an empty fragment.
    pub fn new(html: impl Into<String>) -> Result<Self> {
        let html = html.into();
        if html.is_empty() {
            return Err(Error::MissingContent);
        }
        Ok(Self { html })
    }

    /// Parse a request body.
    ///
    /// Form-encoded bodies are read as such when the content type says so;
    /// everything else is parsed as JSON. Only a non-empty string `html`
    /// field is accepted. Absent, null, empty, non-string and unparsable
    /// inputs all yield [`Error::MissingContent`].
    pub fn from_body(content_type: Option<&str>, body: &[u8]) -> Result<Self> {
        let html = if media_type(content_type).as_deref() == Some(FORM_URLENCODED) {
            url::form_urlencoded::parse(body)
                .find(|(key, _)| key == "html")
                .map(|(_, value)| value.into_owned())
        } else {
            match serde_json::from_slice::<JsonBody>(body) {
                Ok(JsonBody {
                    html: Some(Value::String(s)),
                }) => Some(s),
                Ok(_) => None,
                Err(e) => {
                    log::debug!("request body is not a JSON object: {}", e);
                    None
                }
            }
        };

        html.map_or(Err(Error::MissingContent), Self::new)
    }
}

fn media_type(content_type: Option<&str>) -> Option<String> {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mt| mt.trim().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(body: &str) -> Result<RenderRequest> {
        RenderRequest::from_body(Some("application/json"), body.as_bytes())
    }

    #[test]
    fn accepts_non_empty_html() {
        let req = json(r#"{"html":"<div>Jane</div>"}"#).unwrap();
        assert_eq!(req.html, "<div>Jane</div>");
    }

    #[test]
    fn whitespace_only_markup_is_still_content() {
        assert!(json(r#"{"html":" "}"#).is_ok());
    }

    #[test]
    fn falsy_html_is_missing() {
        for body in [
            r#"{}"#,
            r#"{"html":""}"#,
            r#"{"html":null}"#,
            r#"{"html":false}"#,
            r#"{"html":0}"#,
            r#"{"other":"<p>x</p>"}"#,
        ] {
            assert!(matches!(json(body), Err(Error::MissingContent)), "{body}");
        }
    }

    #[test]
    fn non_string_truthy_html_is_rejected() {
        assert!(matches!(json(r#"{"html":42}"#), Err(Error::MissingContent)));
        assert!(matches!(json(r#"{"html":["<p>"]}"#), Err(Error::MissingContent)));
    }

    #[test]
    fn unparsable_or_empty_body_is_missing() {
        assert!(matches!(json(""), Err(Error::MissingContent)));
        assert!(matches!(json("<p>not json</p>"), Err(Error::MissingContent)));
        assert!(matches!(json(r#""just a string""#), Err(Error::MissingContent)));
    }

    #[test]
    fn missing_content_type_falls_back_to_json() {
        let req = RenderRequest::from_body(None, br#"{"html":"<b>x</b>"}"#).unwrap();
        assert_eq!(req.html, "<b>x</b>");
    }

    #[test]
    fn form_encoded_body_is_decoded() {
        let req = RenderRequest::from_body(
            Some("application/x-www-form-urlencoded; charset=UTF-8"),
            b"name=jane&html=%3Cdiv+class%3D%22p-4%22%3EJane%3C%2Fdiv%3E",
        )
        .unwrap();
        assert_eq!(req.html, r#"<div class="p-4">Jane</div>"#);
    }

    #[test]
    fn form_encoded_empty_html_is_missing() {
        let res = RenderRequest::from_body(Some("application/x-www-form-urlencoded"), b"html=");
        assert!(matches!(res, Err(Error::MissingContent)));
    }
}
