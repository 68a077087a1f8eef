//! HTTP server: a `tiny_http` listener drained by a fixed pool of worker threads.
//!
//! Each worker handles one request at a time from start to finish, so a slow
//! render only ties up its own worker. Requests share nothing but the
//! listener.

use crate::{CardHandler, Engine, Error, Reply, Result};
use log::{info, warn};
use std::io::Read;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tiny_http::{Header, Method, Request, Response};

/// How long a worker blocks waiting for a request before checking for shutdown
const RECV_TIMEOUT: Duration = Duration::from_millis(250);

/// Stops a running server's workers
#[derive(Clone)]
pub struct ShutdownHandle {
    stop: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

pub struct Server<E: Engine + 'static> {
    http: Arc<tiny_http::Server>,
    handler: Arc<CardHandler<E>>,
    workers: usize,
    stop: Arc<AtomicBool>,
}

impl<E: Engine + 'static> Server<E> {
    /// Bind `addr` and prepare `workers` worker threads (not started yet).
    pub fn bind(addr: &str, handler: CardHandler<E>, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::Config("worker count must be at least 1".into()));
        }
        let http = tiny_http::Server::http(addr)
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))?;
        Ok(Self {
            http: Arc::new(http),
            handler: Arc::new(handler),
            workers,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The bound socket address (useful when binding port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            stop: self.stop.clone(),
        }
    }

    /// Start the workers and return their join handles.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        info!(
            "listening on {} with {} worker(s)",
            self.http.server_addr(),
            self.workers
        );
        (0..self.workers)
            .filter_map(|id| {
                let http = self.http.clone();
                let handler = self.handler.clone();
                let stop = self.stop.clone();
                thread::Builder::new()
                    .name(format!("card-worker-{}", id))
                    .spawn(move || worker_loop(&http, &handler, &stop))
                    .map_err(|e| warn!("failed to spawn worker {}: {}", id, e))
                    .ok()
            })
            .collect()
    }

    /// Run until shut down, blocking the calling thread.
    pub fn run(self) -> Result<()> {
        let handles = self.spawn();
        if handles.is_empty() {
            return Err(Error::Other("no worker threads could be started".into()));
        }
        for handle in handles {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
        info!("server stopped");
        Ok(())
    }
}

fn worker_loop<E: Engine>(http: &tiny_http::Server, handler: &CardHandler<E>, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        match http.recv_timeout(RECV_TIMEOUT) {
            Ok(Some(request)) => serve(request, handler),
            Ok(None) => continue,
            Err(e) => {
                warn!("failed to receive request: {}", e);
                break;
            }
        }
    }
}

fn serve<E: Engine>(mut request: Request, handler: &CardHandler<E>) {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.url().to_string();
    let content_type = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_string());

    // The method decides before the body is read, so a large GET is still a 405
    let reply = if *request.method() != Method::Post {
        Reply::from_error(&Error::MethodNotAllowed)
    } else {
        match read_body(&mut request, handler.max_body_bytes()) {
            Ok(body) => handler.handle(&method, content_type.as_deref(), &body),
            Err(e) => {
                warn!("rejecting body of {} {}: {}", method, path, e);
                Reply::from_error(&e)
            }
        }
    };

    let status = reply.status;
    if let Err(e) = request.respond(to_response(reply)) {
        warn!("failed to write response for {} {}: {}", method, path, e);
    }
    info!(
        "{} {} -> {} ({}ms)",
        method,
        path,
        status,
        started.elapsed().as_millis()
    );
}

/// Read at most `limit` bytes; anything beyond is a `PayloadTooLarge`, and a
/// stream that breaks off mid-body is a `BodyRead`.
fn read_body(request: &mut Request, limit: usize) -> Result<Vec<u8>> {
    if request.body_length().is_some_and(|len| len > limit) {
        return Err(Error::PayloadTooLarge(limit));
    }
    let mut body = Vec::new();
    request
        .as_reader()
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| Error::BodyRead(e.to_string()))?;
    if body.len() > limit {
        return Err(Error::PayloadTooLarge(limit));
    }
    Ok(body)
}

fn to_response(reply: Reply) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut response = Response::from_data(reply.body).with_status_code(reply.status);
    for (name, value) in reply.headers {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => response.add_header(header),
            Err(()) => warn!("dropping invalid response header {}", name),
        }
    }
    response
}
