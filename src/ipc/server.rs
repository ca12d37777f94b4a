//! Unix domain socket server for IPC
//!
//! Accepts the start trigger, answers status queries and pushes interaction
//! events (and, on request, waveform frames) to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::events::InteractionEvent;
use crate::state::{Command, InteractionState};
use crate::waveform::WaveFrame;

use super::protocol::{DaemonStatus, Notification, Request, Response, MAX_MESSAGE_LEN};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    state: Arc<RwLock<ServerState>>,
    hub: Hub,
    shutdown_tx: broadcast::Sender<()>,
}

/// Shared server state
struct ServerState {
    status: DaemonStatus,
    start_time: std::time::Instant,
}

/// Channels each client handler needs
#[derive(Clone)]
struct Hub {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<InteractionEvent>,
    frames: broadcast::Sender<WaveFrame>,
}

/// Broadcast feeds a client has subscribed to
#[derive(Default)]
struct Subscriptions {
    events: Option<broadcast::Receiver<InteractionEvent>>,
    frames: Option<broadcast::Receiver<WaveFrame>>,
}

impl Server {
    /// Create a new IPC server
    pub fn new(
        socket_path: &Path,
        commands: mpsc::Sender<Command>,
        events: broadcast::Sender<InteractionEvent>,
        frames: broadcast::Sender<WaveFrame>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(RwLock::new(ServerState {
            status: DaemonStatus::default(),
            start_time: std::time::Instant::now(),
        }));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            state,
            hub: Hub {
                commands,
                events,
                frames,
            },
            shutdown_tx,
        })
    }

    /// Fold an interaction event into the status snapshot
    pub async fn observe(&self, event: &InteractionEvent) {
        let mut server_state = self.state.write().await;
        match event {
            InteractionEvent::StateChanged { to, .. } => {
                let old_state = server_state.status.state;
                server_state.status.state = *to;
                if old_state != *to {
                    debug!(from = %old_state, to = %to, "IPC server: state updated");
                }
            }
            InteractionEvent::Status(status) => {
                server_state.status.status = Some(status.clone());
            }
            InteractionEvent::SessionStarted { document } => {
                server_state.status.document = Some(document.clone());
            }
            _ => {}
        }
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let state = Arc::clone(&self.state);
                    let hub = self.hub.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, state, hub) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(
        stream: UnixStream,
        state: Arc<RwLock<ServerState>>,
        hub: Hub,
    ) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();

        // Reads run on their own task so a half-read message is never
        // dropped by the select below
        let (request_tx, mut request_rx) = mpsc::channel::<Result<Request, String>>(8);
        let reader_task = tokio::spawn(async move {
            loop {
                match read_message::<Request>(&mut reader).await {
                    Ok(Some(request)) => {
                        if request_tx.send(Ok(request)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = request_tx.send(Err(format!("{e:#}"))).await;
                        break;
                    }
                }
            }
        });

        let mut subscriptions = Subscriptions::default();

        let result = loop {
            tokio::select! {
                request = request_rx.recv() => {
                    let Some(request) = request else {
                        debug!("client disconnected");
                        break Ok(());
                    };

                    let response = match request {
                        Ok(request) => {
                            debug!(?request, "received request");
                            Self::process_request(request, &state, &hub, &mut subscriptions).await
                        }
                        Err(message) => {
                            warn!(%message, "malformed request");
                            Response::error("bad_request", message)
                        }
                    };

                    if let Err(e) = send_message(&mut writer, &response).await {
                        break Err(e);
                    }
                }

                event = next_from(&mut subscriptions.events) => match event {
                    Ok(event) => {
                        if let Err(e) = send_message(&mut writer, &Notification::Event { event }).await {
                            break Err(e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "subscriber lagged behind events");
                    }
                    Err(broadcast::error::RecvError::Closed) => subscriptions.events = None,
                },

                frame = next_from(&mut subscriptions.frames) => match frame {
                    Ok(frame) => {
                        if let Err(e) = send_message(&mut writer, &Notification::Frame { frame }).await {
                            break Err(e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => subscriptions.frames = None,
                },
            }
        };

        reader_task.abort();
        result
    }

    /// Process a request and return a response
    async fn process_request(
        request: Request,
        state: &Arc<RwLock<ServerState>>,
        hub: &Hub,
        subscriptions: &mut Subscriptions,
    ) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let mut state = state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                Response::Status(state.status.clone())
            }

            Request::Start { document } => {
                {
                    let state = state.read().await;
                    if let Some(running) = &state.status.document {
                        if state.status.state != InteractionState::Error {
                            debug!(%running, "start refused, session already running");
                            return Response::error(
                                "already_running",
                                format!("session for {running:?} is already running"),
                            );
                        }
                    }
                }

                let document = document.unwrap_or_default();
                info!(%document, "start requested via IPC");
                match hub.commands.send(Command::Start { document }).await {
                    Ok(()) => Response::Started,
                    Err(_) => Response::error("unavailable", "state machine is not running"),
                }
            }

            Request::Subscribe { frames } => {
                if subscriptions.events.is_none() {
                    subscriptions.events = Some(hub.events.subscribe());
                }
                subscriptions.frames = frames.then(|| hub.frames.subscribe());
                debug!(frames, "client subscribed to notifications");
                Response::Subscribed { frames }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Receive from an optional feed; pending forever when not subscribed
async fn next_from<T: Clone>(
    rx: &mut Option<broadcast::Receiver<T>>,
) -> Result<T, broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Read a length-prefixed JSON message; `None` on clean disconnect
async fn read_message<T: DeserializeOwned>(reader: &mut OwnedReadHalf) -> Result<Option<T>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        anyhow::bail!("message too large ({len} bytes)");
    }

    let mut msg_buf = vec![0u8; len];
    reader.read_exact(&mut msg_buf).await?;

    let message = serde_json::from_slice(&msg_buf).context("failed to parse request")?;
    Ok(Some(message))
}

/// Send a length-prefixed JSON message
async fn send_message<T: Serialize>(writer: &mut OwnedWriteHalf, msg: &T) -> Result<()> {
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;

    Ok(())
}
