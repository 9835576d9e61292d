//! HTTP routes for the contact form.

use super::store::{Contact, ContactStore, NewContact};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::error;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: ContactStore,
    pub static_dir: Arc<PathBuf>,
}

/// Answer to a submission: `"successo"` or `"errore"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn success() -> Self {
        Self {
            status: "successo".to_string(),
        }
    }

    fn failure() -> Self {
        Self {
            status: "errore".to_string(),
        }
    }
}

/// Builds the service router. `static_dir` holds `index.html` and assets.
pub fn router(store: ContactStore, static_dir: impl Into<PathBuf>) -> Router {
    let static_dir = static_dir.into();
    let mut app = Router::new()
        .route("/", get(home))
        .route("/aggiungi", post(add_contact))
        .route("/lista", get(list_contacts));

    if static_dir.is_dir() {
        app = app.nest_service("/static", ServeDir::new(&static_dir));
    }

    app.with_state(AppState {
        store,
        static_dir: Arc::new(static_dir),
    })
}

async fn home(State(state): State<AppState>) -> Response {
    let index = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            error!(path = %index.display(), error = %e, "index page unavailable");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}

async fn add_contact(
    State(state): State<AppState>,
    Json(contact): Json<NewContact>,
) -> Json<StatusResponse> {
    match state.store.add(&contact) {
        Ok(_) => Json(StatusResponse::success()),
        Err(e) => {
            error!(error = %e, "failed to store contact");
            Json(StatusResponse::failure())
        }
    }
}

async fn list_contacts(
    State(state): State<AppState>,
) -> Result<Json<Vec<Contact>>, (StatusCode, String)> {
    state.store.list().map(Json).map_err(|e| {
        error!(error = %e, "failed to list contacts");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}
