//! Mock chat-completion provider for integration tests
//!
//! Serves a scripted body over real TCP: fixed chunks with per-chunk delays,
//! or an open-ended body fed by the test through a channel.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

/// What the mock answers every completion request with
#[derive(Debug, Clone)]
pub enum Script {
    /// A finite body delivered chunk by chunk
    Chunks {
        /// Response status
        status: StatusCode,
        /// Each chunk with the delay before it is written
        chunks: Vec<(Duration, Bytes)>,
    },
    /// `initial` chunks, then whatever the test pushes through [`MockLlm::open_sender`]
    OpenEnded {
        /// Chunks written immediately
        initial: Vec<Bytes>,
    },
}

impl Script {
    /// 200 response with the whole body in one chunk
    pub fn body(body: &str) -> Self {
        Self::status(StatusCode::OK, body)
    }

    /// Response with the given status and a one-chunk body
    pub fn status(status: StatusCode, body: &str) -> Self {
        Self::Chunks {
            status,
            chunks: vec![(Duration::ZERO, Bytes::copy_from_slice(body.as_bytes()))],
        }
    }

    /// 200 response split into `size`-byte chunks, flushed with a small delay
    /// between them so they arrive as separate reads
    pub fn split(body: &str, size: usize) -> Self {
        Self::Chunks {
            status: StatusCode::OK,
            chunks: body
                .as_bytes()
                .chunks(size)
                .map(|chunk| (Duration::from_millis(2), Bytes::copy_from_slice(chunk)))
                .collect(),
        }
    }

    /// 200 response with explicit per-chunk delays
    pub fn timed(chunks: &[(u64, &str)]) -> Self {
        Self::Chunks {
            status: StatusCode::OK,
            chunks: chunks
                .iter()
                .map(|(delay_ms, chunk)| (Duration::from_millis(*delay_ms), Bytes::copy_from_slice(chunk.as_bytes())))
                .collect(),
        }
    }

    /// Body that stays open until the test closes it
    pub fn open_ended(initial: &[&str]) -> Self {
        Self::OpenEnded {
            initial: initial.iter().map(|chunk| Bytes::copy_from_slice(chunk.as_bytes())).collect(),
        }
    }
}

/// Mock provider bound to an ephemeral local port
pub struct MockLlm {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockLlmState>,
}

struct MockLlmState {
    script: Script,
    completion_count: AtomicU32,
    requests: Mutex<Vec<serde_json::Value>>,
    /// Feeds the most recent open-ended body
    open_sender: Mutex<Option<mpsc::Sender<Bytes>>>,
}

impl MockLlm {
    /// Start the mock server, returning immediately
    pub async fn start(script: Script) -> anyhow::Result<Self> {
        let state = Arc::new(MockLlmState {
            script,
            completion_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
            open_sender: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider
    ///
    /// Includes `/v1` since the preset appends `/chat/completions`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Number of completion requests received
    pub fn completion_count(&self) -> u32 {
        self.state.completion_count.load(Ordering::Relaxed)
    }

    /// JSON bodies of every request received, in order
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Sender feeding the open-ended body of the latest request
    pub fn open_sender(&self) -> Option<mpsc::Sender<Bytes>> {
        self.state.open_sender.lock().unwrap().clone()
    }
}

impl Drop for MockLlm {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_chat_completions(
    State(state): State<Arc<MockLlmState>>,
    Json(request): Json<serde_json::Value>,
) -> Response {
    state.completion_count.fetch_add(1, Ordering::Relaxed);
    state.requests.lock().unwrap().push(request);

    match state.script.clone() {
        Script::Chunks { status, chunks } => {
            let body = futures_util::stream::iter(chunks).then(|(delay, chunk)| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok::<_, Infallible>(chunk)
            });

            (
                status,
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(body),
            )
                .into_response()
        }
        Script::OpenEnded { initial } => {
            let (sender, receiver) = mpsc::channel(16);
            for chunk in initial {
                sender.try_send(chunk).ok();
            }
            *state.open_sender.lock().unwrap() = Some(sender);

            let body = ReceiverStream::new(receiver).map(Ok::<_, Infallible>);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(body),
            )
                .into_response()
        }
    }
}
