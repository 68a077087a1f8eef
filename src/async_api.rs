use crate::{CardRenderer, Engine, Error, RenderedCard, Result};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Render(String, oneshot::Sender<Result<RenderedCard>>),
    Close(oneshot::Sender<()>),
}

/// An async-friendly renderer backed by a dedicated worker thread.
///
/// The worker thread owns the `CardRenderer` and runs the blocking browser
/// calls, so async tasks can await a card without stalling the runtime.
/// Renders submitted through one `AsyncRenderer` (and its clones) run one at
/// a time, in submission order.
#[derive(Clone)]
pub struct AsyncRenderer {
    cmd_tx: Sender<Command>,
}

impl AsyncRenderer {
    /// Move `renderer` onto a new worker thread.
    pub fn spawn<E: Engine + 'static>(renderer: CardRenderer<E>) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

        thread::Builder::new()
            .name("card-render-async".to_string())
            .spawn(move || {
                // Command loop
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        Command::Render(html, resp) => {
                            let res = renderer.render(&html);
                            let _ = resp.send(res);
                        }
                        Command::Close(resp) => {
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
            })?;

        Ok(Self { cmd_tx })
    }

    /// Render `html` into a card on the worker thread.
    pub async fn render(&self, html: &str) -> Result<RenderedCard> {
        if html.is_empty() {
            return Err(Error::MissingContent);
        }
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Render(html.to_string(), tx))
            .map_err(|_| Error::Other("Render worker has shut down".into()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Render canceled: {}", e)))?
    }

    /// Shutdown the background worker.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Close(tx))
            .map_err(|_| Error::Other("Render worker has shut down".into()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))
    }
}
