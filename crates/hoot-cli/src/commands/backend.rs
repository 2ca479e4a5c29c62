//! Route requests to the daemon, or run them in-process when it is down.

use anyhow::{Context, Result};
use hoot_core::{
    config::{DB_FILE, SETTINGS_FILE, SOCKET_FILE},
    ipc::{IpcClient, IpcRequest, IpcResponse, RequestHandler},
    FocusEngine, Settings,
};
use hoot_storage::Database;
use std::{
    path::Path,
    sync::{atomic::AtomicBool, Arc},
};

use super::helpers::ensure_ok;

pub enum Backend {
    Daemon(IpcClient),
    Local(RequestHandler),
}

impl Backend {
    pub async fn connect(data_dir: &Path) -> Result<Self> {
        let sock_path = data_dir.join(SOCKET_FILE);
        let client = IpcClient::new(&sock_path);
        if sock_path.exists() && client.is_reachable().await {
            log::debug!("Using daemon at {}", sock_path.display());
            return Ok(Self::Daemon(client));
        }

        log::debug!("Daemon not reachable, running in-process");
        Ok(Self::Local(local_handler(data_dir)?))
    }

    pub const fn is_daemon(&self) -> bool {
        matches!(self, Self::Daemon(_))
    }

    /// Send a request; error responses become `Err`
    pub async fn send(&self, request: IpcRequest) -> Result<IpcResponse> {
        let response = match self {
            Self::Daemon(client) => client
                .send_command(request)
                .await
                .context("Failed to talk to the daemon")?,
            Self::Local(handler) => handler.dispatch(request).await,
        };
        ensure_ok(response)
    }
}

/// Open an in-process engine over the data directory
pub fn local_handler(data_dir: &Path) -> Result<RequestHandler> {
    let settings = Settings::load(&data_dir.join(SETTINGS_FILE))?;
    let db = Database::new(Some(data_dir.join(DB_FILE)))?;
    let engine = FocusEngine::open(Arc::new(db), settings)?;
    Ok(RequestHandler::new(
        Arc::new(engine),
        Arc::new(AtomicBool::new(false)),
    ))
}
