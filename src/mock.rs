//! In-process engine double with injectable failures and call accounting.

use crate::{Engine, Error, Page, PdfOptions, Result, Session, Viewport, WaitOptions};
use std::sync::{Arc, Mutex};

/// Minimal bytes that look like a PDF to callers
pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n%%EOF\n";

/// Which step of the pipeline should fail
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Failure {
    Launch,
    NewPage,
    Viewport,
    ContentTimeout,
    Pdf,
    Close,
}

#[derive(Debug, Default)]
struct Recorded {
    calls: Vec<&'static str>,
    launched: usize,
    closed: usize,
    viewport: Option<Viewport>,
    html: Option<String>,
    pdf: Option<PdfOptions>,
}

/// Shared view onto what the mock engine was asked to do
#[derive(Debug, Clone, Default)]
pub struct MockStats(Arc<Mutex<Recorded>>);

impl MockStats {
    fn record<F: FnOnce(&mut Recorded)>(&self, f: F) {
        f(&mut self.0.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().calls.clone()
    }

    pub fn launched(&self) -> usize {
        self.0.lock().unwrap().launched
    }

    pub fn closed(&self) -> usize {
        self.0.lock().unwrap().closed
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.0.lock().unwrap().viewport
    }

    pub fn last_html(&self) -> Option<String> {
        self.0.lock().unwrap().html.clone()
    }

    pub fn pdf_options(&self) -> Option<PdfOptions> {
        self.0.lock().unwrap().pdf.clone()
    }
}

#[derive(Debug, Clone)]
pub struct MockEngine {
    failure: Option<Failure>,
    stats: MockStats,
}

impl MockEngine {
    pub fn healthy() -> Self {
        Self {
            failure: None,
            stats: MockStats::default(),
        }
    }

    pub fn failing(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            stats: MockStats::default(),
        }
    }

    pub fn stats(&self) -> MockStats {
        self.stats.clone()
    }
}

impl Engine for MockEngine {
    type Session = MockSession;

    fn launch(&self) -> Result<MockSession> {
        if self.failure == Some(Failure::Launch) {
            return Err(Error::RenderEngineUnavailable("browser executable not found".into()));
        }
        self.stats.record(|r| {
            r.calls.push("launch");
            r.launched += 1;
        });
        Ok(MockSession {
            failure: self.failure,
            stats: self.stats.clone(),
        })
    }
}

pub struct MockSession {
    failure: Option<Failure>,
    stats: MockStats,
}

impl Session for MockSession {
    type Page = MockPage;

    fn new_page(&self) -> Result<MockPage> {
        self.stats.record(|r| r.calls.push("new_page"));
        if self.failure == Some(Failure::NewPage) {
            return Err(Error::PageSetup("target crashed".into()));
        }
        Ok(MockPage {
            failure: self.failure,
            stats: self.stats.clone(),
        })
    }

    fn close(self) -> Result<()> {
        self.stats.record(|r| {
            r.calls.push("close");
            r.closed += 1;
        });
        if self.failure == Some(Failure::Close) {
            return Err(Error::Other("browser process already gone".into()));
        }
        Ok(())
    }
}

pub struct MockPage {
    failure: Option<Failure>,
    stats: MockStats,
}

impl Page for MockPage {
    fn set_viewport(&self, viewport: &Viewport) -> Result<()> {
        self.stats.record(|r| {
            r.calls.push("set_viewport");
            r.viewport = Some(*viewport);
        });
        if self.failure == Some(Failure::Viewport) {
            return Err(Error::PageSetup("Emulation.setDeviceMetricsOverride rejected".into()));
        }
        Ok(())
    }

    fn set_content(&self, html: &str, wait: &WaitOptions) -> Result<()> {
        self.stats.record(|r| {
            r.calls.push("set_content");
            r.html = Some(html.to_string());
        });
        if self.failure == Some(Failure::ContentTimeout) {
            return Err(Error::ContentLoadTimeout(wait.timeout.as_millis() as u64));
        }
        Ok(())
    }

    fn print_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>> {
        self.stats.record(|r| {
            r.calls.push("print_pdf");
            r.pdf = Some(options.clone());
        });
        if self.failure == Some(Failure::Pdf) {
            return Err(Error::PdfExportFailure("Printing failed".into()));
        }
        Ok(FAKE_PDF.to_vec())
    }
}
