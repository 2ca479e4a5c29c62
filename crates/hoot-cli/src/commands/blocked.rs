//! Terminal rendering of the block surface

use anyhow::Result;
use hoot_core::{
    ipc::{IpcRequest, IpcResponse},
    BlockPage,
};

use super::backend::Backend;

pub async fn show(backend: &Backend) -> Result<()> {
    match backend.send(IpcRequest::BlockPage).await? {
        IpcResponse::BlockPage(page) => {
            print!("{}", render(&page));
            Ok(())
        }
        other => anyhow::bail!("Unexpected response: {other:?}"),
    }
}

fn render(page: &BlockPage) -> String {
    let mut lines = vec!["Hoot! This one is blocked.".to_string()];

    if let Some(block) = &page.last_block {
        lines.push(format!("Blocked: {}", block.title));
        lines.push(format!("URL:     {}", block.url));
        lines.push(format!("Why:     {}", block.reason));
    }
    if let Some(goal) = &page.goal {
        lines.push(format!("Goal:    {goal}"));
    }
    if page.remaining_seconds > 0 {
        lines.push(format!("Left:    {}", page.remaining_display()));
    }
    lines.push(String::new());
    lines.push(page.roast.clone());
    lines.push(String::new());
    lines.push(format!(
        "Need out? Run `{}` to end the session and lift every block.",
        page.escape_hatch
    ));

    let mut out = String::new();
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out
}
