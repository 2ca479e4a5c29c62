/// Data management command handlers
use anyhow::Result;
use hoot_core::config::DB_FILE;
use hoot_storage::Database;
use std::path::Path;

use super::backend::Backend;

/// Wipe all persisted state; ends a running session first
pub async fn handle_data_clear(data_dir: &Path, yes: bool) -> Result<()> {
    if !yes {
        println!("This deletes the session, block list, last block and AI configuration.");
        println!("Re-run with --yes to confirm.");
        return Ok(());
    }

    let backend = Backend::connect(data_dir).await?;
    super::focus::end(&backend).await?;
    drop(backend);

    let db = Database::new(Some(data_dir.join(DB_FILE)))?;
    db.clear_all()?;
    println!("All hoot data cleared.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoot_storage::Session;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let dir = tempdir().unwrap();
        let db = Database::new(Some(dir.path().join(DB_FILE))).unwrap();
        db.save_session(&Session::new("focus".to_string(), chrono::Utc::now(), 600))
            .unwrap();

        handle_data_clear(dir.path(), false).await.unwrap();
        assert!(db.load_session_state().unwrap().session.is_some());

        handle_data_clear(dir.path(), true).await.unwrap();
        assert!(db.load_session_state().unwrap().session.is_none());
    }
}
