//! Helper utility functions for CLI commands

use anyhow::Result;
use hoot_core::ipc::IpcResponse;

/// Session length used when no duration flag is given (one pomodoro)
pub const DEFAULT_SESSION_MINUTES: i64 = 25;

/// Safely truncate a string to a maximum number of characters (not bytes).
/// This avoids panics when slicing multi-byte UTF-8 characters.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Combine duration flags into seconds; all zero means the default length
pub fn session_seconds(hours: i64, minutes: i64, seconds: i64) -> i64 {
    if hours == 0 && minutes == 0 && seconds == 0 {
        return DEFAULT_SESSION_MINUTES * 60;
    }
    hours
        .saturating_mul(3600)
        .saturating_add(minutes.saturating_mul(60))
        .saturating_add(seconds)
}

/// Turn an IPC error response into an `anyhow` error
pub fn ensure_ok(response: IpcResponse) -> Result<IpcResponse> {
    match response {
        IpcResponse::Error { kind, message } => anyhow::bail!("{kind}: {message}"),
        other => Ok(other),
    }
}

pub fn print_rule() {
    println!("{}", "\u{2550}".repeat(40));
}
