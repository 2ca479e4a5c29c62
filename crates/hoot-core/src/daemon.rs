use anyhow::Result;
use chrono::Utc;
use hoot_storage::Database;
use std::{
    fs,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::interval;

use crate::{
    config::Settings,
    engine::FocusEngine,
    ipc::{listen, RequestHandler},
};

const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

/// Background process: serves IPC and keeps the deadline honest
pub struct Daemon {
    engine: Arc<FocusEngine>,
    ipc_handler: Arc<RequestHandler>,
    shutdown_signal: Arc<AtomicBool>,
    sock_path: PathBuf,
    tick_interval_seconds: u64,
}

impl Daemon {
    /// Open the engine (recovering stored state) and prepare the IPC handler
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be opened
    pub fn new(db: Database, settings: Settings, sock_path: PathBuf) -> Result<Self> {
        let tick_interval_seconds = settings.daemon.tick_interval_seconds.max(1);
        let engine = Arc::new(FocusEngine::open(Arc::new(db), settings)?);
        let shutdown_signal = Arc::new(AtomicBool::new(false));

        Ok(Self {
            ipc_handler: Arc::new(RequestHandler::new(engine.clone(), shutdown_signal.clone())),
            engine,
            shutdown_signal,
            sock_path,
            tick_interval_seconds,
        })
    }

    /// # Errors
    ///
    /// Returns an error if shutdown cleanup fails
    pub async fn run_with_signals(&mut self) -> Result<()> {
        let sock_path = self.sock_path.clone();
        let ipc_handler = self.ipc_handler.clone();

        tokio::spawn(async move {
            if let Err(e) = listen(ipc_handler, &sock_path).await {
                log::error!("IPC listener failed: {e}");
            }
        });

        let mut interval = interval(Duration::from_secs(self.tick_interval_seconds));
        let mut shutdown_poll = tokio::time::interval(SHUTDOWN_POLL);
        log::info!("Daemon started with signal handling and IPC");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        log::error!("Daemon tick failed: {e}");
                    }
                }
                _ = shutdown_poll.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Received Ctrl-C, shutting down...");
                    self.shutdown_signal.store(true, Ordering::SeqCst);
                }
            }

            if self.shutdown_signal.load(Ordering::SeqCst) {
                break;
            }
        }

        if self.sock_path.exists() {
            fs::remove_file(&self.sock_path)?;
        }
        log::info!("Daemon shut down gracefully.");
        Ok(())
    }

    async fn tick(&self) -> Result<()> {
        if self.engine.reconcile(Utc::now()).await? {
            log::info!("Session expired during tick");
        }
        Ok(())
    }
}
