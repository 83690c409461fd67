//! Web UI
//!
//! One page with a round button per stream, a volume slider and an add form.
//! All handlers share a single state behind a mutex and answer form posts
//! with a redirect back to the page.

pub mod error;
pub mod page;

use anyhow::{Context, Result};
use askama::Template;
use axum::{
    extract::State,
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::trace::TraceLayer;

use crate::player::{self, volume, Player};
use crate::prompt::{AddStreamFlow, FileForm, Step, StreamForm};
use crate::streams::StreamList;
use crate::theme::Palette;
use error::AppError;
use page::IndexPage;

pub struct WebState {
    pub streams: StreamList,
    pub player: Player,
    pub palette: Palette,
    pub selection: usize, // 1-based, 0 = off
    pub volume: u8,
    pub notifications: bool,
}

pub type SharedState = Arc<Mutex<WebState>>;

#[derive(Deserialize)]
pub struct SelectionForm {
    pub selection: usize,
}

#[derive(Deserialize)]
pub struct VolumeForm {
    pub volume: u8,
}

#[derive(Deserialize)]
pub struct AddStreamForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/set_stream", post(set_stream))
        .route("/set_volume", post(set_volume))
        .route("/add_stream", post(add_stream))
        .route("/remove_stream", post(remove_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the web UI until Ctrl+C / SIGTERM, then stop playback
pub async fn serve(address: &str, state: SharedState) -> Result<()> {
    let app = router(state.clone());

    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Could not bind to {}", address))?;
    tracing::info!("Web UI running on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down");
    state.lock().await.player.stop().await
}

async fn index(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    let mut state = state.lock().await;

    // Player died (stream ended, network gone): show it as off
    if state.selection != 0 && state.player.now_playing().is_none() {
        state.selection = 0;
    }

    let page = IndexPage::new(state.streams.streams(), &state.palette, state.selection, state.volume);
    Ok(Html(page.render()?))
}

async fn set_stream(
    State(state): State<SharedState>,
    Form(form): Form<SelectionForm>,
) -> Result<Redirect, AppError> {
    let mut guard = state.lock().await;
    let state = &mut *guard;

    if form.selection > state.streams.len() {
        return Err(AppError::BadRequest(format!("No stream {}", form.selection)));
    }

    state.player.stop().await?;
    state.selection = 0;

    let Some(stream) = form
        .selection
        .checked_sub(1)
        .and_then(|i| state.streams.get(i))
        .cloned()
    else {
        return Ok(Redirect::to("/"));
    };

    state.player.play(&stream.name, &stream.address).await?;
    state.selection = form.selection;

    if state.notifications {
        player::notify_playing(&stream.name);
    }

    Ok(Redirect::to("/"))
}

async fn set_volume(
    State(state): State<SharedState>,
    Form(form): Form<VolumeForm>,
) -> Result<Redirect, AppError> {
    let mut state = state.lock().await;
    state.volume = volume::set_volume(form.volume).await?;

    Ok(Redirect::to("/"))
}

async fn add_stream(
    State(state): State<SharedState>,
    Form(form): Form<AddStreamForm>,
) -> Result<Redirect, AppError> {
    let mut flow = AddStreamFlow::new();

    let Step::Ask(_) = flow.answer(Some(form.name)) else {
        return Ok(Redirect::to("/"));
    };
    let Step::Submit(stream) = flow.answer(Some(form.address)) else {
        return Ok(Redirect::to("/"));
    };

    let mut state = state.lock().await;
    let mut form = FileForm::new(&mut state.streams);
    form.fill(&stream.name, &stream.address);
    form.submit()?;

    Ok(Redirect::to("/"))
}

async fn remove_stream(
    State(state): State<SharedState>,
    Form(form): Form<SelectionForm>,
) -> Result<Redirect, AppError> {
    let mut guard = state.lock().await;
    let state = &mut *guard;

    let Some(index) = form.selection.checked_sub(1) else {
        return Err(AppError::BadRequest(format!("No stream {}", form.selection)));
    };
    let Some(removed) = state.streams.delete(index)? else {
        return Err(AppError::BadRequest(format!("No stream {}", form.selection)));
    };

    if state.selection == form.selection {
        state.selection = 0;
        state.player.stop().await?;
    } else if state.selection > form.selection {
        state.selection -= 1;
    }

    tracing::info!("Removed stream {}", removed.name);

    Ok(Redirect::to("/"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }

        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::streams::Stream;

    fn state_with(dir: &tempfile::TempDir, streams: &[(&str, &str)]) -> SharedState {
        state_at(dir.path().join("streams.json"), streams)
    }

    fn state_at(path: std::path::PathBuf, streams: &[(&str, &str)]) -> SharedState {
        let mut list = StreamList::load(path).unwrap();
        while list.remove(0).is_some() {}
        for (name, address) in streams {
            list.push(Stream::new(*name, *address));
        }

        Arc::new(Mutex::new(WebState {
            streams: list,
            player: Player::new("ffmpeg", "default"),
            palette: Palette::default(),
            selection: 0,
            volume: 40,
            notifications: false,
        }))
    }

    fn post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_shows_colorized_buttons() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, &[("Radio", "http://radio/stream"), ("a", "http://a/stream")]);

        let response = router(state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();

        assert!(html.contains(r#"style="--stream-color: #eba0ac">R</button>"#));
        assert!(html.contains(r#"style="--stream-color: #b4befe">A</button>"#));
    }

    #[tokio::test]
    async fn test_add_stream_with_empty_address_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, &[("Radio", "http://radio/stream")]);

        let response = router(state.clone())
            .oneshot(post("/add_stream", "name=Studio+One&address="))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(state.lock().await.streams.len(), 1);
        assert!(!dir.path().join("streams.json").exists());
    }

    #[tokio::test]
    async fn test_add_stream_saves() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, &[]);

        let response = router(state.clone())
            .oneshot(post("/add_stream", "name=Studio+One&address=http%3A%2F%2Fstudio.one%2Flive"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let saved = StreamList::load(dir.path().join("streams.json")).unwrap();
        assert_eq!(saved.streams(), &[Stream::new("Studio One", "http://studio.one/live")]);
    }

    #[tokio::test]
    async fn test_set_stream_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, &[("Radio", "http://radio/stream")]);

        let response = router(state)
            .oneshot(post("/set_stream", "selection=2"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_set_stream_off() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, &[("Radio", "http://radio/stream")]);
        state.lock().await.selection = 1;

        let response = router(state.clone())
            .oneshot(post("/set_stream", "selection=0"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(state.lock().await.selection, 0);
    }

    #[tokio::test]
    async fn test_remove_stream_shifts_selection() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(
            &dir,
            &[("Radio", "http://radio/stream"), ("YleX", "http://ylex/stream")],
        );
        state.lock().await.selection = 2;

        let response = router(state.clone())
            .oneshot(post("/remove_stream", "selection=1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let state = state.lock().await;
        assert_eq!(state.selection, 1);
        assert_eq!(state.streams.streams()[0].name, "YleX");
        assert!(dir.path().join("streams.json").exists());
    }

    #[tokio::test]
    async fn test_remove_stream_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, &[]);

        let response = router(state)
            .oneshot(post("/remove_stream", "selection=0"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_list_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let state = state_at(blocker.join("streams.json"), &[("Radio", "http://radio/stream")]);

        let response = router(state.clone())
            .oneshot(post("/add_stream", "name=X&address=Y"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = router(state.clone())
            .oneshot(post("/remove_stream", "selection=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let state = state.lock().await;
        assert_eq!(state.streams.streams(), &[Stream::new("Radio", "http://radio/stream")]);
    }
}
