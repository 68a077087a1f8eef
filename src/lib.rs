//! ID Card Renderer
//!
//! Renders an HTML fragment into a single-page PDF sized to a physical ID
//! card (54mm × 85.6mm) using a headless browser, and exposes that as one
//! HTTP endpoint.
//!
//! # Features
//!
//! - **CDP Backend** (default): Uses Chrome DevTools Protocol via headless Chrome
//! - **Scoped sessions**: One browser per request, closed on every exit path
//! - **Swappable engine**: Rendering goes through the [`Engine`] trait so tests
//!   and alternative backends can stand in for Chrome
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "cdp")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use idcard_render::{cdp::CdpEngine, CardRenderer, LaunchConfig, RenderConfig};
//!
//! let renderer = CardRenderer::new(CdpEngine::new(LaunchConfig::default()), RenderConfig::default());
//! let card = renderer.render("<div class=\"p-4\">Jane Doe</div>")?;
//! std::fs::write(&card.filename, &card.bytes)?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "cdp"))]
//! # fn main() {}
//! ```

use std::path::PathBuf;
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

#[cfg(feature = "cdp")]
pub mod cdp;

pub mod async_api;
pub mod handler;
pub mod idle;
pub mod provision;
pub mod renderer;
pub mod request;
pub mod server;
pub mod template;

#[cfg(test)]
pub(crate) mod mock;

pub use async_api::AsyncRenderer;
pub use handler::{CardHandler, Reply};
pub use renderer::{CardRenderer, RenderedCard};
pub use request::RenderRequest;

/// Filename offered to the client in `Content-Disposition`.
pub const CARD_FILENAME: &str = "VLSI_ID_Card.pdf";

/// Configuration for a card renderer
///
/// The defaults reproduce the fixed card format: a 1200×1200 viewport at
/// device scale factor 2, printed onto a 54mm × 85.6mm page at scale 0.58.
///
/// # Examples
///
/// ```
/// let cfg = idcard_render::RenderConfig::default();
/// assert_eq!(cfg.viewport.width, 1200);
/// assert_eq!(cfg.filename, "VLSI_ID_Card.pdf");
/// ```
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Page viewport applied before content is loaded
    pub viewport: Viewport,
    /// How long and how strictly to wait for the network to settle
    pub wait: WaitOptions,
    /// PDF export parameters
    pub pdf: PdfOptions,
    /// Download filename for the rendered card
    pub filename: String,
    /// Largest request body accepted by the HTTP handler
    pub max_body_bytes: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            wait: WaitOptions::default(),
            pdf: PdfOptions::default(),
            filename: CARD_FILENAME.to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Viewport dimensions in CSS pixels plus device scale factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1200,
            device_scale_factor: 2.0,
        }
    }
}

/// Network-quiescence wait applied after the document is injected
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitOptions {
    /// Hard deadline for the page to settle
    pub timeout: Duration,
    /// How long the network must stay quiet to count as idle
    pub idle_window: Duration,
    /// Requests allowed in flight while still counting as idle
    pub max_inflight: usize,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            idle_window: Duration::from_millis(500),
            max_inflight: 0,
        }
    }
}

/// Page margins in millimetres
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// PDF export parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    /// Physical page width in millimetres
    pub width_mm: f64,
    /// Physical page height in millimetres
    pub height_mm: f64,
    /// Print CSS backgrounds and colors
    pub print_background: bool,
    /// Page range selector, e.g. "1"
    pub page_ranges: String,
    pub margin_mm: Margins,
    /// Content scale factor applied by the print pipeline
    pub scale: f64,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            width_mm: 54.0,
            height_mm: 85.6,
            print_background: true,
            page_ranges: "1".to_string(),
            margin_mm: Margins::default(),
            scale: 0.58,
        }
    }
}

impl PdfOptions {
    /// Page width in inches, the unit the DevTools print command expects.
    pub fn width_in(&self) -> f64 {
        mm_to_inches(self.width_mm)
    }

    /// Page height in inches.
    pub fn height_in(&self) -> f64 {
        mm_to_inches(self.height_mm)
    }
}

/// Convert millimetres to inches.
pub fn mm_to_inches(mm: f64) -> f64 {
    mm / 25.4
}

/// Browser launch parameters
///
/// Owned by the engine that launches the browser; [`RenderConfig`] only covers
/// what happens inside a session. `executable` and `args` normally come from
/// [`provision::Provision`].
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchConfig {
    /// Browser binary; `None` lets the backend auto-detect one
    pub executable: Option<PathBuf>,
    /// Extra command-line switches passed to the browser
    pub args: Vec<String>,
    pub headless: bool,
    /// Keep the OS-level sandbox enabled
    pub sandbox: bool,
    pub ignore_certificate_errors: bool,
    /// Default window size used at launch
    pub window: (u32, u32),
    /// Connection idle time after which the backend gives up on the browser
    pub idle_browser_timeout: Duration,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        let vp = Viewport::default();
        Self {
            executable: None,
            args: Vec::new(),
            headless: true,
            sandbox: true,
            ignore_certificate_errors: true,
            window: (vp.width, vp.height),
            idle_browser_timeout: Duration::from_secs(30),
        }
    }
}

/// Launches rendering sessions.
///
/// One implementation exists per backend. The renderer calls [`Engine::launch`]
/// once per request and owns the returned session until it is closed.
pub trait Engine: Send + Sync {
    type Session: Session;

    /// Start a fresh browser instance
    fn launch(&self) -> Result<Self::Session>;
}

/// A running browser instance owned by a single request
pub trait Session {
    type Page: Page;

    /// Open a new page/document context
    fn new_page(&self) -> Result<Self::Page>;

    /// Terminate the browser and release its resources
    fn close(self) -> Result<()>;
}

/// A page inside a session
pub trait Page {
    /// Apply an explicit viewport (size and device scale factor)
    fn set_viewport(&self, viewport: &Viewport) -> Result<()>;

    /// Replace the page document with `html` and block until the network
    /// settles or `wait.timeout` elapses (an error in the latter case)
    fn set_content(&self, html: &str, wait: &WaitOptions) -> Result<()>;

    /// Export the current page as PDF bytes
    fn print_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>>;
}
