//! The development server. It serves the output directory over HTTP, watches
//! the sources for changes, rebuilds the site after each burst of changes,
//! and tells connected browsers to reload through a server-sent-events
//! endpoint.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::build::build_site;
use crate::config::Config;
use crate::write::PAGE_FILE;

/// The server-sent-events endpoint browsers subscribe to.
pub const RELOAD_PATH: &str = "/__livereload";

/// The name of the event sent after each successful rebuild.
pub const RELOAD_EVENT: &str = "reload";

/// How long the sources must stay quiet before a rebuild starts.
pub const QUIET_WINDOW: Duration = Duration::from_millis(150);

const RELOAD_SCRIPT: &str = r#"<script>new EventSource("/__livereload").addEventListener("reload", () => location.reload());</script>"#;

/// Shared state for the request handlers.
pub struct ServerState {
    pub output_directory: PathBuf,

    /// Fires once per successful rebuild.
    pub reload: broadcast::Sender<()>,
}

/// Builds the router: the reload endpoint plus the output directory.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(RELOAD_PATH, get(livereload))
        .fallback(serve_file)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Serves `config`'s output directory on `addr` until interrupted,
/// rebuilding whenever the content directory, the static directory, or the
/// project file change. The caller is expected to have run the initial
/// build.
pub async fn serve(config: Config, addr: SocketAddr) -> Result<()> {
    let (reload, _) = broadcast::channel(16);
    let (changes_tx, changes) = mpsc::unbounded_channel();

    // dropping the watcher stops it, so it lives as long as the server
    let _watcher = watch(&watched_paths(&config), changes_tx).context("start file watcher")?;
    tokio::spawn(rebuild_on_change(config.clone(), changes, reload.clone()));

    let app = router(ServerState {
        output_directory: config.output_directory.clone(),
        reload,
    });
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| anyhow!("bind {addr}: {err}"))?;
    info!(addr = %addr, output = %config.output_directory.display(), "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "listening for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn watched_paths(config: &Config) -> Vec<PathBuf> {
    vec![
        config.content_directory.clone(),
        config.static_directory.clone(),
        config.project_file.clone(),
    ]
}

/// Starts a watcher that sends one message per create, modify, or remove
/// event under `paths`. Paths that don't exist are skipped.
fn watch(paths: &[PathBuf], changes: mpsc::UnboundedSender<()>) -> notify::Result<RecommendedWatcher> {
    let mut watcher =
        notify::recommended_watcher(move |result: notify::Result<notify::Event>| match result {
            Ok(event) if is_change(&event.kind) => {
                debug!(paths = ?event.paths, "source changed");
                // the receiver only goes away when the server shuts down
                let _ = changes.send(());
            }
            Ok(_) => {}
            Err(err) => warn!(%err, "watching sources"),
        })?;

    for path in paths {
        let mode = match path.is_dir() {
            true => RecursiveMode::Recursive,
            false => RecursiveMode::NonRecursive,
        };
        if path.exists() {
            watcher.watch(path, mode)?;
            debug!(path = %path.display(), "watching");
        } else {
            warn!(path = %path.display(), "not watching missing path");
        }
    }
    Ok(watcher)
}

fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Waits for a change, then keeps absorbing changes until none arrive for
/// `window`. Returns `false` once the channel is closed and drained.
pub async fn debounce(changes: &mut mpsc::UnboundedReceiver<()>, window: Duration) -> bool {
    if changes.recv().await.is_none() {
        return false;
    }
    loop {
        match tokio::time::timeout(window, changes.recv()).await {
            Ok(Some(())) => continue,
            // closed or quiet; either way the pending change still gets built
            Ok(None) | Err(_) => return true,
        }
    }
}

/// Rebuilds once per burst of changes. Builds run one at a time on the
/// blocking pool; the project file is reloaded for each so edits to it take
/// effect. A failed build leaves the previous output in place.
async fn rebuild_on_change(
    config: Config,
    mut changes: mpsc::UnboundedReceiver<()>,
    reload: broadcast::Sender<()>,
) {
    let project_file = config.project_file.clone();
    let output_directory = config.output_directory.clone();

    while debounce(&mut changes, QUIET_WINDOW).await {
        let project_file = project_file.clone();
        let output_directory = output_directory.clone();
        let result = tokio::task::spawn_blocking(move || -> Result<_> {
            let config = Config::from_project_file(&project_file, Some(&output_directory))?;
            Ok(build_site(&config)?)
        })
        .await;

        match result {
            Ok(Ok(summary)) => {
                info!(posts = summary.posts, "rebuilt site");
                // no viewers connected is fine
                let _ = reload.send(());
            }
            Ok(Err(err)) => error!("rebuild failed: {err:#}"),
            Err(err) => error!(%err, "rebuild task failed"),
        }
    }
}

async fn livereload(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.reload.subscribe()).map(|result| {
        if let Err(err) = result {
            // a lagged viewer still needs to reload
            debug!(%err, "reload subscriber lagged");
        }
        Ok::<_, Infallible>(Event::default().event(RELOAD_EVENT).data(RELOAD_EVENT))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn serve_file(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    if let Some(path) = html_target(&state.output_directory, request.uri().path()) {
        match tokio::fs::read_to_string(&path).await {
            Ok(html) => return Html(inject_reload(&html)).into_response(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(%err, path = %path.display(), "reading page");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    }

    match ServeDir::new(&state.output_directory).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

/// Maps a request path onto the HTML file it names inside
/// `output_directory`: `.html` paths directly, and directory paths (ending
/// in `/`) to their `index.html`. Returns `None` for any other path and for
/// paths that try to leave the output directory.
pub fn html_target(output_directory: &Path, uri_path: &str) -> Option<PathBuf> {
    let mut path = output_directory.to_owned();
    for component in Path::new(uri_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if uri_path.ends_with('/') {
        path.push(PAGE_FILE);
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => Some(path),
        _ => None,
    }
}

/// Inserts the reload script before the last `</body>`, or appends it when
/// there is none.
pub fn inject_reload(html: &str) -> String {
    match html.rfind("</body>") {
        Some(i) => format!("{}{}\n{}", &html[..i], RELOAD_SCRIPT, &html[i..]),
        None => format!("{}{}\n", html, RELOAD_SCRIPT),
    }
}
