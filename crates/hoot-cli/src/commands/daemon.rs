/// Daemon lifecycle management commands
use anyhow::Result;
use std::{env, fs, io, path::Path, process::Command, thread::sleep, time};
use sysinfo::{Pid, System};
use hoot_core::{
    config::{get_data_dir, DB_FILE, LOG_FILE, PID_FILE, SETTINGS_FILE, SOCKET_FILE},
    ipc::{IpcClient, IpcRequest, IpcResponse},
    Daemon, Settings,
};
use hoot_storage::Database;

fn read_pid(pid_file_path: &Path) -> Option<usize> {
    fs::read_to_string(pid_file_path)
        .ok()
        .and_then(|pid| pid.trim().parse::<usize>().ok())
}

fn is_process_alive(pid: usize) -> bool {
    let mut sys = System::new();
    sys.refresh_process(Pid::from(pid))
}

pub fn start_daemon(data_dir: &Path) -> Result<()> {
    let pid_file_path = data_dir.join(PID_FILE);
    let sock_path = data_dir.join(SOCKET_FILE);

    if pid_file_path.exists() {
        if let Some(pid) = read_pid(&pid_file_path) {
            if is_process_alive(pid) {
                log::info!("Daemon is already running (PID: {pid}).");
                return Ok(());
            }
        }
        log::warn!("Removing stale PID file.");
        let _ = fs::remove_file(&pid_file_path);
    }

    if sock_path.exists() {
        log::warn!("Removing stale socket file.");
        fs::remove_file(&sock_path)?;
    }

    fs::create_dir_all(data_dir)?;
    log::info!("Starting Hoot daemon...");

    let current_exe = env::current_exe()?;
    let current_dir = env::current_dir()?;
    let child = Command::new(current_exe)
        .arg("daemon-internal-start")
        .current_dir(current_dir)
        .spawn()?;

    log::info!("Daemon process started with PID: {}", child.id());
    fs::write(&pid_file_path, child.id().to_string())?;

    Ok(())
}

pub async fn run_daemon_process() -> Result<()> {
    // Detached process: nothing is attached to stderr, so log to a file.
    if let Err(e) = setup_daemon_logging() {
        eprintln!("Failed to set up daemon logging: {e}");
        return Err(e);
    }
    log::info!("Daemon process started internally.");

    if let Err(e) = daemon_main_logic().await {
        log::error!("Daemon main logic exited with a fatal error: {e:#}");
        return Err(e);
    }

    Ok(())
}

async fn daemon_main_logic() -> Result<()> {
    let data_dir = get_data_dir()?;
    let settings = Settings::load(&data_dir.join(SETTINGS_FILE))?;
    let db = Database::new(Some(data_dir.join(DB_FILE)))?;
    let mut daemon = Daemon::new(db, settings, data_dir.join(SOCKET_FILE))?;
    daemon.run_with_signals().await
}

pub async fn stop_daemon(data_dir: &Path) -> Result<()> {
    let pid_file_path = data_dir.join(PID_FILE);
    let sock_path = data_dir.join(SOCKET_FILE);

    if !pid_file_path.exists() {
        log::info!("Daemon is not running (no PID file).");
        if sock_path.exists() {
            fs::remove_file(&sock_path)?;
        }
        return Ok(());
    }

    let pid_str = fs::read_to_string(&pid_file_path)?;
    let pid = pid_str
        .trim()
        .parse::<usize>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    log::info!("Stopping Hoot daemon (PID: {pid})...");
    let client = IpcClient::new(&sock_path);

    match client.send_command(IpcRequest::Shutdown).await {
        Ok(IpcResponse::Shutdown) => {
            log::info!("Daemon shutdown signal sent. Waiting for process to exit...");
            wait_for_exit(pid);
        }
        Ok(resp) => log::error!("Received unexpected response from daemon: {resp:?}"),
        Err(e) => {
            log::error!("Failed to send shutdown command: {e}. Forcing cleanup.");
            kill(pid);
        }
    }

    fs::remove_file(&pid_file_path)?;
    if sock_path.exists() {
        fs::remove_file(&sock_path)?;
    }

    Ok(())
}

fn wait_for_exit(pid: usize) {
    let deadline = time::Instant::now() + time::Duration::from_secs(3);

    while time::Instant::now() < deadline {
        if !is_process_alive(pid) {
            log::info!("Daemon stopped successfully.");
            return;
        }
        sleep(time::Duration::from_millis(200));
    }
    log::warn!("Daemon did not stop gracefully. Force killing...");
    kill(pid);
}

fn kill(pid: usize) {
    let mut sys = System::new();
    if sys.refresh_process(Pid::from(pid)) {
        if let Some(process) = sys.process(Pid::from(pid)) {
            process.kill();
            log::info!("Process killed.");
        }
    }
}

pub async fn show_daemon_status(data_dir: &Path) -> Result<()> {
    let pid = read_pid(&data_dir.join(PID_FILE)).filter(|pid| is_process_alive(*pid));
    let sock_path = data_dir.join(SOCKET_FILE);
    let reachable = sock_path.exists() && IpcClient::new(&sock_path).is_reachable().await;

    match (pid, reachable) {
        (Some(pid), true) => println!("Daemon Status: Running (PID: {pid})"),
        (Some(pid), false) => println!("Daemon Status: Starting or not responding (PID: {pid})"),
        (None, true) => println!("Daemon Status: Running (unknown PID)"),
        (None, false) => println!("Daemon Status: Not running"),
    }
    println!("Data directory: {}", data_dir.display());
    Ok(())
}

fn setup_daemon_logging() -> Result<()> {
    use std::fs::{create_dir_all, OpenOptions};

    let log_path = get_data_dir()?.join(LOG_FILE);

    if let Some(parent) = log_path.parent() {
        create_dir_all(parent)?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Debug)
        .init();

    Ok(())
}
