//! The card rendering pipeline: launch, configure, inject, settle, print, close.

use crate::template::build_document;
use crate::{Engine, Error, Page, RenderConfig, Result, Session};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::time::Instant;

/// A rendered ID card ready to be sent as a download
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCard {
    /// Raw PDF bytes
    pub bytes: Vec<u8>,
    /// Filename offered to the client
    pub filename: String,
}

impl RenderedCard {
    /// Value for the `Content-Disposition` response header
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Closes the session when dropped unless it was released explicitly.
struct SessionGuard<S: Session> {
    session: Option<S>,
    tag: String,
}

impl<S: Session> SessionGuard<S> {
    fn new(session: S, tag: &str) -> Self {
        Self {
            session: Some(session),
            tag: tag.to_string(),
        }
    }

    fn session(&self) -> Result<&S> {
        self.session
            .as_ref()
            .ok_or_else(|| Error::Other("rendering session already released".into()))
    }

    fn release(mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => session.close(),
            None => Ok(()),
        }
    }
}

impl<S: Session> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("[{}] closing session on failure path", self.tag);
            if let Err(e) = session.close() {
                warn!("[{}] failed to close rendering session: {}", self.tag, e);
            }
        }
    }
}

/// Renders HTML fragments into ID-card PDFs with one fresh session per call
pub struct CardRenderer<E: Engine> {
    engine: E,
    config: RenderConfig,
}

impl<E: Engine> CardRenderer<E> {
    pub fn new(engine: E, config: RenderConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `fragment` into a card.
    ///
    /// All-or-nothing: any failure after launch closes the session and
    /// returns the error; no partial PDF is produced.
    pub fn render(&self, fragment: &str) -> Result<RenderedCard> {
        let tag = fingerprint(fragment);
        let started = Instant::now();

        debug!("[{}] launching rendering engine", tag);
        let guard = SessionGuard::new(self.engine.launch()?, &tag);

        let bytes = self.render_in(guard.session()?, fragment, &tag)?;

        if let Err(e) = guard.release() {
            warn!("[{}] failed to close rendering session: {}", tag, e);
        }

        debug!(
            "[{}] rendered {} bytes in {}ms",
            tag,
            bytes.len(),
            started.elapsed().as_millis()
        );
        Ok(RenderedCard {
            bytes,
            filename: self.config.filename.clone(),
        })
    }

    fn render_in(&self, session: &E::Session, fragment: &str, tag: &str) -> Result<Vec<u8>> {
        let page = session.new_page()?;

        debug!("[{}] viewport {:?}", tag, self.config.viewport);
        page.set_viewport(&self.config.viewport)?;

        let document = build_document(fragment);
        debug!("[{}] loading document ({} bytes)", tag, document.len());
        page.set_content(&document, &self.config.wait)?;

        debug!("[{}] exporting pdf", tag);
        page.print_pdf(&self.config.pdf)
    }
}

/// Short, stable identifier for a fragment used to correlate log lines.
pub fn fingerprint(fragment: &str) -> String {
    let digest = Sha256::digest(fragment.as_bytes());
    hex::encode(&digest[..6])
}
