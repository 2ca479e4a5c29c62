//! Session, navigation and video commands

use anyhow::Result;
use chrono::{Duration, Local, Utc};
use clap::Subcommand;
use hoot_ai::VideoMetadata;
use hoot_core::{
    block_surface::format_remaining,
    ipc::{IpcRequest, IpcResponse},
    EngineStatus, NavigationDecision, NavigationKind, SchedulerState,
};
use tabled::{Table, Tabled};

use super::backend::Backend;
use super::helpers::{print_rule, truncate_str};

#[derive(Subcommand, Debug)]
pub enum BlocklistAction {
    /// Show the active block list
    Show,
    /// Recompute the block list for the running session
    Refresh,
    /// Turn site blocking off until the next session
    Clear,
}

#[derive(Tabled)]
struct BlockedDomain {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Domain")]
    domain: String,
}

fn unexpected(response: &IpcResponse) -> anyhow::Error {
    anyhow::anyhow!("Unexpected response: {response:?}")
}

pub async fn start(backend: &Backend, goal: String, duration_seconds: i64) -> Result<()> {
    let response = backend
        .send(IpcRequest::StartSession {
            goal,
            duration_seconds,
        })
        .await?;
    let session = match response {
        IpcResponse::SessionStarted(session) => session,
        other => return Err(unexpected(&other)),
    };

    println!("Focus session started: {}", session.goal);
    println!(
        "Ends at {} ({})",
        session.end_time.with_timezone(&Local).format("%H:%M:%S"),
        format_remaining(session.duration())
    );
    if !backend.is_daemon() {
        println!(
            "Note: the daemon is not running, so the session is closed by the next hoot \
             command after the deadline. Run `hoot daemon start` for on-time completion."
        );
    }
    Ok(())
}

pub async fn end(backend: &Backend) -> Result<()> {
    match backend.send(IpcRequest::EndSession).await? {
        IpcResponse::SessionEnded { cleared: true } => {
            println!("Session ended. Blocking is off.");
        }
        IpcResponse::SessionEnded { cleared: false } => {
            println!("No session was running. Blocking is off.");
        }
        other => return Err(unexpected(&other)),
    }
    Ok(())
}

pub async fn status(backend: &Backend, json: bool) -> Result<()> {
    let status = match backend.send(IpcRequest::Status).await? {
        IpcResponse::Status(status) => status,
        other => return Err(unexpected(&other)),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }
    print_status(&status, backend.is_daemon());
    Ok(())
}

fn print_status(status: &EngineStatus, daemon: bool) {
    println!(
        "Daemon: {}",
        if daemon { "Running" } else { "Not running" }
    );
    print_rule();

    match status.session.as_ref().filter(|s| s.active) {
        Some(session) => {
            println!("Goal:      {}", session.goal);
            println!(
                "Remaining: {}",
                format_remaining(Duration::seconds(status.remaining_seconds))
            );
            println!(
                "Ends at:   {}",
                session.end_time.with_timezone(&Local).format("%H:%M:%S")
            );
            println!("Blocking:  {} domains", status.block_list.len());
        }
        None => println!("No focus session running."),
    }

    if daemon {
        let alarm = match status.scheduler {
            SchedulerState::Idle => "idle".to_string(),
            SchedulerState::Armed(at) => {
                format!("armed for {}", at.with_timezone(&Local).format("%H:%M:%S"))
            }
            SchedulerState::Fired(_) => "firing".to_string(),
        };
        println!("Alarm:     {alarm}");
    }

    if let Some(block) = &status.last_block {
        println!(
            "\nLast block: {} ({})",
            truncate_str(&block.title, 60),
            block.reason
        );
    }
    if let Some(notification) = &status.last_notification {
        let age = Utc::now() - notification.timestamp;
        println!(
            "Last notification: {} - {} ({} min ago)",
            notification.title,
            notification.message,
            age.num_minutes()
        );
    }
}

pub async fn check(backend: &Backend, url: String, history: bool, json: bool) -> Result<()> {
    let kind = if history {
        NavigationKind::HistoryStateUpdated
    } else {
        NavigationKind::Committed
    };
    let response = backend
        .send(IpcRequest::CheckNavigation { url, kind })
        .await?;
    let decision = match response {
        IpcResponse::Navigation(decision) => decision,
        other => return Err(unexpected(&other)),
    };

    if json {
        println!("{}", serde_json::to_string(&decision)?);
        return Ok(());
    }
    match decision {
        NavigationDecision::Allow => println!("allow"),
        NavigationDecision::Redirect { domain, to } => {
            println!("block {domain}");
            println!("redirect {to}");
        }
        NavigationDecision::Delegate { video_id } => match video_id {
            Some(id) => println!("delegate video {id}"),
            None => println!("delegate"),
        },
    }
    Ok(())
}

pub async fn analyze(
    backend: &Backend,
    observer_id: String,
    video: VideoMetadata,
    goal: Option<String>,
    json: bool,
) -> Result<()> {
    let response = backend
        .send(IpcRequest::AnalyzeVideo {
            observer_id,
            video,
            goal,
        })
        .await?;
    let (allowed, reason, redirect) = match response {
        IpcResponse::Verdict {
            allowed,
            reason,
            redirect,
        } => (allowed, reason, redirect),
        other => return Err(unexpected(&other)),
    };

    if json {
        let value = serde_json::json!({
            "allowed": allowed,
            "reason": reason,
            "redirect": redirect,
        });
        println!("{value}");
        return Ok(());
    }
    println!("{}: {reason}", if allowed { "allow" } else { "block" });
    if let Some(redirect) = redirect {
        println!("redirect {redirect}");
    }
    Ok(())
}

pub async fn blocklist(backend: &Backend, action: BlocklistAction) -> Result<()> {
    match action {
        BlocklistAction::Show => {
            let status = match backend.send(IpcRequest::Status).await? {
                IpcResponse::Status(status) => status,
                other => return Err(unexpected(&other)),
            };
            if status.block_list.is_empty() {
                println!("Site blocking is off.");
                return Ok(());
            }
            let rows: Vec<BlockedDomain> = status
                .block_list
                .into_iter()
                .enumerate()
                .map(|(i, domain)| BlockedDomain {
                    index: i + 1,
                    domain,
                })
                .collect();
            println!("{}", Table::new(rows));
        }
        BlocklistAction::Refresh => match backend.send(IpcRequest::UpdateBlockList).await? {
            IpcResponse::Success { success: true } => println!("Block list refreshed."),
            IpcResponse::Success { success: false } => {
                println!("No session running; nothing to refresh.");
            }
            other => return Err(unexpected(&other)),
        },
        BlocklistAction::Clear => {
            backend.send(IpcRequest::ClearBlockList).await?;
            println!("Site blocking is off until the next session.");
        }
    }
    Ok(())
}

pub async fn notify(backend: &Backend, message: String) -> Result<()> {
    match backend.send(IpcRequest::ShowNotification { message }).await? {
        IpcResponse::Notified { ok: true } => Ok(()),
        IpcResponse::Notified { ok: false } => anyhow::bail!("Notification could not be stored"),
        other => Err(unexpected(&other)),
    }
}
