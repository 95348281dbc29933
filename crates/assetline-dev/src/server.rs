//! Development HTTP server with live reload

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Response, StatusCode};
use axum::middleware;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures::stream::Stream;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::ServeError;
use crate::reload::ReloadHub;

/// Server-sent events endpoint the injected script listens on
pub const RELOAD_ENDPOINT: &str = "/__assetline/reload";

/// Largest page the server will rewrite to inject the reload script
const MAX_INJECT_BYTES: usize = 16 * 1024 * 1024;

const RELOAD_SCRIPT: &str = concat!(
    "<script>(function(){var s=new EventSource(\"",
    "/__assetline/reload",
    "\");s.addEventListener(\"reload\",function(){location.reload();});})();</script>"
);

/// Insert the live-reload script before the closing body tag, or append it
pub fn inject_live_reload(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + RELOAD_SCRIPT.len());
            out.push_str(&html[..at]);
            out.push_str(RELOAD_SCRIPT);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{}{}", html, RELOAD_SCRIPT),
    }
}

/// Static file server over the site root
#[derive(Debug, Clone)]
pub struct DevServer {
    root: PathBuf,
    addr: String,
    reload: ReloadHub,
    live_reload: bool,
}

impl DevServer {
    pub fn new(root: impl Into<PathBuf>, host: &str, port: u16, reload: ReloadHub) -> Self {
        Self {
            root: root.into(),
            addr: format!("{}:{}", host, port),
            reload,
            live_reload: true,
        }
    }

    pub fn live_reload(mut self, enabled: bool) -> Self {
        self.live_reload = enabled;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Routes: the reload endpoint, then static files
    pub fn router(&self) -> Router {
        let files = ServeDir::new(&self.root).append_index_html_on_directories(true);
        let mut router = Router::new()
            .route(RELOAD_ENDPOINT, get(reload_events))
            .with_state(self.reload.clone())
            .fallback_service(files);
        if self.live_reload {
            router = router.layer(middleware::map_response(inject_into_html));
        }
        router.layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener, ServeError> {
        TcpListener::bind(&self.addr)
            .await
            .map_err(|source| ServeError::Bind {
                addr: self.addr.clone(),
                source,
            })
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve_on(
        &self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServeError> {
        let local: Option<SocketAddr> = listener.local_addr().ok();
        info!(
            addr = %local.map(|a| a.to_string()).unwrap_or_else(|| self.addr.clone()),
            root = %self.root.display(),
            "dev server listening"
        );
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    /// Bind and serve until `shutdown` resolves
    pub async fn serve(
        &self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServeError> {
        let listener = self.bind().await?;
        self.serve_on(listener, shutdown).await
    }
}

/// Stream reload events to one browser
async fn reload_events(
    State(hub): State<ReloadHub>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = hub.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    yield Ok(Event::default().event("reload").data(event.tasks.join(",")));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Missed events still mean the page is stale
                    yield Ok(Event::default().event("reload").data(""));
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}

async fn inject_into_html(response: Response<Body>) -> Response<Body> {
    // Partial content and redirects keep their bodies
    if response.status() != StatusCode::OK {
        return response;
    }
    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    if !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_INJECT_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read page for live reload: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let html = inject_live_reload(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    if let Ok(len) = HeaderValue::from_str(&html.len().to_string()) {
        parts.headers.insert(header::CONTENT_LENGTH, len);
    }
    Response::from_parts(parts, Body::from(html))
}
