//! Chat web server.
//!
//! `GET /` answers any pending question for the caller's session and renders
//! the transcript. `POST /` records a message and redirects back to `GET /`,
//! so the answer is produced by the page load that follows.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use confassist_chatbot::Answerer;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::UiConfig;
use crate::render::{render_error_page, render_page};
use crate::session::{ChatSession, SubmitOutcome};

/// Cookie holding the caller's session id.
pub const SESSION_COOKIE: &str = "confassist_session";

type SharedSession = Arc<Mutex<ChatSession>>;

struct SessionEntry {
    session: SharedSession,
    last_seen: Instant,
}

/// Live chat sessions keyed by cookie id.
///
/// Each session has its own mutex, so one visitor's turns run one at a time
/// while different visitors proceed in parallel. Sessions not seen for
/// `idle_timeout` are dropped on the next lookup.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Return the session for `id`, or start a new one under a fresh id.
    pub async fn get_or_create(&self, id: Option<Uuid>, greeting: &str) -> (Uuid, SharedSession) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_timeout);
        let expired = before - sessions.len();
        if expired > 0 {
            debug!("Expired {expired} idle sessions");
        }

        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return (id, Arc::clone(&entry.session));
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(ChatSession::new(greeting)));
        sessions.insert(
            id,
            SessionEntry {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        debug!("Started session {id}");
        (id, session)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// State shared by every request.
#[derive(Clone)]
pub struct AppState {
    answerer: Arc<dyn Answerer>,
    sessions: SessionStore,
    ui: Arc<UiConfig>,
}

impl AppState {
    pub fn new(answerer: Arc<dyn Answerer>, ui: UiConfig) -> Self {
        Self {
            answerer,
            sessions: SessionStore::new(Duration::from_secs(ui.session_idle_secs)),
            ui: Arc::new(ui),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Resolve the caller's session from its cookie, issuing one if needed.
    async fn session_for(&self, jar: CookieJar) -> (CookieJar, SharedSession) {
        let existing = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());
        let (id, session) = self
            .sessions
            .get_or_create(existing, &self.ui.greeting)
            .await;

        let jar = if existing == Some(id) {
            jar
        } else {
            jar.add(
                Cookie::build((SESSION_COOKIE, id.to_string()))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax),
            )
        };
        (jar, session)
    }
}

/// Build the router (shared between `serve` and tests).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(chat_page).post(submit_message))
        .route("/health", get(health))
        .with_state(state)
}

/// Listen on `bind` until Ctrl-C.
pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("Chat UI listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Chat UI stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
    }
}

async fn chat_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, session) = state.session_for(jar).await;
    let mut session = session.lock().await;

    match session.resolve(state.answerer.as_ref()).await {
        Ok(answered) => {
            if answered {
                debug!("Answered pending question");
            }
            (jar, Html(render_page(session.transcript(), &state.ui))).into_response()
        }
        Err(err) => {
            error!("Failed to answer question: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                jar,
                Html(render_error_page(&state.ui)),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageForm {
    #[serde(default)]
    message: String,
}

async fn submit_message(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<MessageForm>,
) -> impl IntoResponse {
    let (jar, session) = state.session_for(jar).await;
    let outcome = session.lock().await.submit(&form.message);
    if outcome != SubmitOutcome::Accepted {
        debug!("Message not recorded: {outcome:?}");
    }
    (jar, Redirect::to("/"))
}

async fn health() -> &'static str {
    "ok"
}
