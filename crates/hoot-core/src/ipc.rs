use anyhow::Result;
use hoot_ai::VideoMetadata;
use hoot_storage::Session;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
};

use crate::block_surface::BlockPage;
use crate::engine::{EngineStatus, FocusEngine};
use crate::error::{ErrorKind, FocusError};
use crate::navigation_guard::{NavigationDecision, NavigationEvent, NavigationKind};

/// IPC request from a client (CLI, browser bridge) to the daemon
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum IpcRequest {
    Status,
    Shutdown,
    StartSession {
        goal: String,
        duration_seconds: i64,
    },
    EndSession,
    ScheduleAlarm {
        end_time_ms: i64,
    },
    UpdateBlockList,
    ClearBlockList,
    CheckNavigation {
        url: String,
        kind: NavigationKind,
    },
    AnalyzeVideo {
        observer_id: String,
        video: VideoMetadata,
        goal: Option<String>,
    },
    ShowNotification {
        message: String,
    },
    BlockPage,
}

/// IPC response from the daemon
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum IpcResponse {
    Status(EngineStatus),
    Shutdown,
    SessionStarted(Session),
    SessionEnded { cleared: bool },
    Scheduled { scheduled: bool },
    Success { success: bool },
    Navigation(NavigationDecision),
    Verdict {
        allowed: bool,
        reason: String,
        redirect: Option<String>,
    },
    Notified { ok: bool },
    BlockPage(BlockPage),
    Error { kind: ErrorKind, message: String },
}

#[derive(Debug)]
pub struct IpcClient {
    sock_path: PathBuf,
}

impl IpcClient {
    #[must_use]
    pub fn new(sock_path: &Path) -> Self {
        Self {
            sock_path: sock_path.to_path_buf(),
        }
    }

    /// Send one request and wait for its response
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon is unreachable or the response is garbled
    pub async fn send_command(&self, request: IpcRequest) -> Result<IpcResponse> {
        let mut stream = UnixStream::connect(&self.sock_path).await?;

        let encoded = bincode::serialize(&request)?;
        stream.write_all(&encoded).await?;
        stream.shutdown().await?;

        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await?;
        let response: IpcResponse = bincode::deserialize(&buffer)?;

        Ok(response)
    }

    /// Whether a daemon answers on the socket
    pub async fn is_reachable(&self) -> bool {
        UnixStream::connect(&self.sock_path).await.is_ok()
    }
}

/// Executes IPC requests against a focus engine
///
/// The CLI uses the same handler in-process when no daemon is running.
pub struct RequestHandler {
    engine: Arc<FocusEngine>,
    shutdown_signal: Arc<AtomicBool>,
}

impl RequestHandler {
    #[must_use]
    pub fn new(engine: Arc<FocusEngine>, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            engine,
            shutdown_signal,
        }
    }

    /// Run a request; failures become `IpcResponse::Error`
    pub async fn dispatch(&self, request: IpcRequest) -> IpcResponse {
        match self.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Request failed: {e}");
                IpcResponse::Error {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        }
    }

    async fn execute(&self, request: IpcRequest) -> Result<IpcResponse, FocusError> {
        let engine = &self.engine;
        let response = match request {
            IpcRequest::Status => IpcResponse::Status(engine.status()?),
            IpcRequest::Shutdown => {
                self.shutdown_signal.store(true, Ordering::SeqCst);
                IpcResponse::Shutdown
            }
            IpcRequest::StartSession {
                goal,
                duration_seconds,
            } => IpcResponse::SessionStarted(engine.start_session(&goal, duration_seconds).await?),
            IpcRequest::EndSession => IpcResponse::SessionEnded {
                cleared: engine.end_session().await?,
            },
            IpcRequest::ScheduleAlarm { end_time_ms } => IpcResponse::Scheduled {
                scheduled: engine.schedule_alarm(end_time_ms).await,
            },
            IpcRequest::UpdateBlockList => IpcResponse::Success {
                success: engine.update_block_list().await?,
            },
            IpcRequest::ClearBlockList => IpcResponse::Success {
                success: engine.clear_block_list().await?,
            },
            IpcRequest::CheckNavigation { url, kind } => IpcResponse::Navigation(
                engine.check_navigation(&NavigationEvent { url, kind })?,
            ),
            IpcRequest::AnalyzeVideo {
                observer_id,
                video,
                goal,
            } => {
                let check = engine
                    .analyze_video(&observer_id, &video, goal.as_deref())
                    .await?;
                IpcResponse::Verdict {
                    allowed: check.verdict.allowed(),
                    reason: check.verdict.reason,
                    redirect: check.redirect,
                }
            }
            IpcRequest::ShowNotification { message } => IpcResponse::Notified {
                ok: engine.show_notification(&message).is_ok(),
            },
            IpcRequest::BlockPage => IpcResponse::BlockPage(engine.block_page().await?),
        };
        Ok(response)
    }

    /// # Errors
    ///
    /// Returns an error if the response cannot be encoded or written
    pub async fn handle(&self, stream: &mut UnixStream, request: IpcRequest) -> Result<()> {
        let response = self.dispatch(request).await;
        let encoded = bincode::serialize(&response)?;
        stream.write_all(&encoded).await?;
        Ok(())
    }
}

/// Accept connections forever, one request per connection
///
/// # Errors
///
/// Returns an error if the socket cannot be bound
pub async fn listen(handler: Arc<RequestHandler>, sock_path: &Path) -> io::Result<()> {
    if sock_path.exists() {
        fs::remove_file(sock_path)?;
    }
    let listener = UnixListener::bind(sock_path)?;
    log::debug!("IPC listening on {}", sock_path.display());

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let handler = handler.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    match stream.read_to_end(&mut buf).await {
                        Ok(0) => {} // Connection closed
                        Ok(_) => match bincode::deserialize::<IpcRequest>(&buf) {
                            Ok(request) => {
                                if let Err(e) = handler.handle(&mut stream, request).await {
                                    log::error!("IPC handle error: {e}");
                                }
                            }
                            Err(e) => {
                                log::error!("IPC deserialize error: {e}");
                            }
                        },
                        Err(e) => {
                            log::error!("IPC read error: {e}");
                        }
                    }
                });
            }
            Err(e) => {
                log::error!("IPC accept error: {e}");
            }
        }
    }
}
