//! Chrome DevTools Protocol backend

use crate::idle::{self, NetworkIdle};
use crate::{mm_to_inches, Engine, Error, LaunchConfig, PdfOptions, Result, Session, Viewport, WaitOptions};
use headless_chrome::browser::tab::{EventListener, Tab};
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::Page as PageDomain;
use headless_chrome::protocol::cdp::{Emulation, Network};
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

type NetworkListener = Arc<dyn EventListener<Event> + Send + Sync>;

/// CDP-based engine (uses the `headless_chrome` crate)
///
/// Every call to [`Engine::launch`] starts a separate Chrome process; nothing
/// is pooled or reused between sessions.
#[derive(Debug, Clone)]
pub struct CdpEngine {
    launch: LaunchConfig,
}

impl CdpEngine {
    pub fn new(launch: LaunchConfig) -> Self {
        Self { launch }
    }
}

impl Engine for CdpEngine {
    type Session = CdpSession;

    fn launch(&self) -> Result<CdpSession> {
        let cfg = &self.launch;
        let args: Vec<&OsStr> = cfg.args.iter().map(OsStr::new).collect();

        // Configure headless Chrome launch options
        let launch_options = LaunchOptions::default_builder()
            .headless(cfg.headless)
            .sandbox(cfg.sandbox)
            .ignore_certificate_errors(cfg.ignore_certificate_errors)
            .window_size(Some(cfg.window))
            .path(cfg.executable.clone())
            .args(args)
            .idle_browser_timeout(cfg.idle_browser_timeout)
            .build()
            .map_err(|e| Error::RenderEngineUnavailable(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::RenderEngineUnavailable(format!("Failed to launch browser: {}", e)))?;

        Ok(CdpSession { browser })
    }
}

/// A running Chrome process
pub struct CdpSession {
    browser: Browser,
}

impl Session for CdpSession {
    type Page = CdpPage;

    fn new_page(&self) -> Result<CdpPage> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| Error::PageSetup(format!("Failed to create tab: {}", e)))?;

        let network = Arc::new(Mutex::new(NetworkIdle::new(Instant::now())));
        let tracker = network.clone();
        let listener: NetworkListener = Arc::new(move |event: &Event| {
            let now = Instant::now();
            let Ok(mut state) = tracker.lock() else {
                return;
            };
            match event {
                Event::NetworkRequestWillBeSent(e) => state.request_started(&e.params.request_id, now),
                Event::NetworkLoadingFinished(e) => state.request_finished(&e.params.request_id, now),
                Event::NetworkLoadingFailed(e) => state.request_finished(&e.params.request_id, now),
                _ => {}
            }
        });

        tab.add_event_listener(listener)
            .map_err(|e| Error::PageSetup(format!("Failed to attach network listener: {}", e)))?;

        // Request events only flow once the Network domain is enabled
        tab.call_method(Network::Enable {
            max_total_buffer_size: None,
            max_resource_buffer_size: None,
            max_post_data_size: None,
            report_direct_socket_traffic: None,
            enable_durable_messages: None,
        })
        .map_err(|e| Error::PageSetup(format!("Failed to enable network events: {}", e)))?;

        Ok(CdpPage { tab, network })
    }

    fn close(self) -> Result<()> {
        // Dropping the browser kills the child process
        drop(self.browser);
        Ok(())
    }
}

/// A single tab plus its in-flight request tracker
pub struct CdpPage {
    tab: Arc<Tab>,
    network: Arc<Mutex<NetworkIdle>>,
}

impl crate::Page for CdpPage {
    fn set_viewport(&self, viewport: &Viewport) -> Result<()> {
        self.tab
            .call_method(Emulation::SetDeviceMetricsOverride {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: viewport.device_scale_factor,
                mobile: false,
                scale: None,
                screen_width: None,
                screen_height: None,
                position_x: None,
                position_y: None,
                dont_set_visible_size: None,
                screen_orientation: None,
                viewport: None,
                display_feature: None,
                device_posture: None,
            })
            .map_err(|e| Error::PageSetup(format!("Failed to set viewport: {}", e)))?;
        Ok(())
    }

    fn set_content(&self, html: &str, wait: &WaitOptions) -> Result<()> {
        let frame_id = self
            .tab
            .call_method(PageDomain::GetFrameTree(None))
            .map_err(|e| Error::ContentLoad(format!("Failed to resolve main frame: {}", e)))?
            .frame_tree
            .frame
            .id;

        if let Ok(mut state) = self.network.lock() {
            state.touch(Instant::now());
        }

        self.tab
            .call_method(PageDomain::SetDocumentContent {
                frame_id,
                html: html.to_string(),
            })
            .map_err(|e| Error::ContentLoad(format!("Failed to set document content: {}", e)))?;

        idle::wait_for_idle(&self.network, wait)
    }

    fn print_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>> {
        let margins = options.margin_mm;
        let pdf_options = PrintToPdfOptions {
            paper_width: Some(options.width_in()),
            paper_height: Some(options.height_in()),
            print_background: Some(options.print_background),
            page_ranges: Some(options.page_ranges.clone()),
            margin_top: Some(mm_to_inches(margins.top)),
            margin_right: Some(mm_to_inches(margins.right)),
            margin_bottom: Some(mm_to_inches(margins.bottom)),
            margin_left: Some(mm_to_inches(margins.left)),
            scale: Some(options.scale),
            ..Default::default()
        };

        self.tab
            .print_to_pdf(Some(pdf_options))
            .map_err(|e| Error::PdfExportFailure(format!("Print to PDF failed: {}", e)))
    }
}
