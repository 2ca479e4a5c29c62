//! Session and block list persistence

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use super::helpers::datetime_from_millis;
use super::kv::{
    get_value, put_value, remove_values, ACTIVE_BLOCK_LIST, BLOCK_LIST_ACTIVE, END_TIME, GOAL,
    IS_RUNNING, LAST_BLOCK, LAST_NOTIFICATION, SESSION_ID, START_TIME,
};
use super::Database;
use crate::models::{LastBlock, Notification, Session};

/// Consistent snapshot of the session layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub session: Option<Session>,
    pub block_list: Vec<String>,
    pub block_list_active: bool,
}

fn read_session(conn: &Connection) -> Result<Option<Session>> {
    let goal: Option<String> = get_value(conn, GOAL)?;
    let end_ms: Option<i64> = get_value(conn, END_TIME)?;

    let (Some(goal), Some(end_ms)) = (goal, end_ms) else {
        return Ok(None);
    };

    let end_time = datetime_from_millis(end_ms)?;
    let start_time = match get_value::<i64>(conn, START_TIME)? {
        Some(ms) => datetime_from_millis(ms)?,
        None => end_time,
    };
    let id = get_value::<Uuid>(conn, SESSION_ID)?.unwrap_or_else(Uuid::nil);
    let active = get_value::<bool>(conn, IS_RUNNING)?.unwrap_or(false);

    Ok(Some(Session {
        id,
        goal,
        start_time,
        end_time,
        active,
    }))
}

fn write_session(conn: &Connection, session: &Session) -> Result<()> {
    put_value(conn, SESSION_ID, &session.id)?;
    put_value(conn, GOAL, &session.goal)?;
    put_value(conn, START_TIME, &session.start_time.timestamp_millis())?;
    put_value(conn, END_TIME, &Some(session.end_time.timestamp_millis()))?;
    put_value(conn, IS_RUNNING, &session.active)
}

fn clear_session_keys(conn: &Connection) -> Result<()> {
    put_value(conn, IS_RUNNING, &false)?;
    put_value(conn, END_TIME, &Option::<i64>::None)?;
    put_value(conn, BLOCK_LIST_ACTIVE, &false)?;
    put_value(conn, ACTIVE_BLOCK_LIST, &Vec::<String>::new())?;
    remove_values(conn, &[GOAL, START_TIME, SESSION_ID])
}

impl Database {
    /// Read session and block list under one lock
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or stored values are corrupted
    pub fn load_session_state(&self) -> Result<SessionState> {
        self.with_conn(|conn| {
            let session = read_session(conn)?;
            let block_list_active = get_value::<bool>(conn, BLOCK_LIST_ACTIVE)?.unwrap_or(false);
            let block_list = if block_list_active {
                get_value::<Vec<String>>(conn, ACTIVE_BLOCK_LIST)?.unwrap_or_default()
            } else {
                Vec::new()
            };
            Ok(SessionState {
                session,
                block_list,
                block_list_active,
            })
        })
    }

    /// Replace the stored session as a whole record
    ///
    /// # Errors
    ///
    /// Returns an error if the write transaction fails
    pub fn save_session(&self, session: &Session) -> Result<()> {
        self.with_tx(|tx| write_session(tx, session))
    }

    /// Replace the stored session and activate its block list together
    ///
    /// # Errors
    ///
    /// Returns an error if the write transaction fails; nothing is stored then
    pub fn save_session_with_block_list(
        &self,
        session: &Session,
        block_list: &[String],
    ) -> Result<()> {
        self.with_tx(|tx| {
            write_session(tx, session)?;
            put_value(tx, ACTIVE_BLOCK_LIST, block_list)?;
            put_value(tx, BLOCK_LIST_ACTIVE, &true)
        })
    }

    /// Clear session and block list in one transaction
    ///
    /// Returns `true` if a session or an active block list was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the write transaction fails
    pub fn clear_session_state(&self) -> Result<bool> {
        self.with_tx(|tx| {
            let had_session = read_session(tx)?.is_some_and(|s| s.active);
            let had_block_list = get_value::<bool>(tx, BLOCK_LIST_ACTIVE)?.unwrap_or(false);
            clear_session_keys(tx)?;
            Ok(had_session || had_block_list)
        })
    }

    /// Clear session and block list only if the stored session ended by `cutoff`
    ///
    /// A block list left active without a running session is cleared as well.
    /// Returns `true` if anything was cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the write transaction fails
    pub fn clear_session_state_if_due(&self, cutoff: DateTime<Utc>) -> Result<bool> {
        self.with_tx(|tx| {
            let session = read_session(tx)?.filter(|s| s.active);
            let block_list_active = get_value::<bool>(tx, BLOCK_LIST_ACTIVE)?.unwrap_or(false);
            let due = match &session {
                Some(session) => session.end_time <= cutoff,
                None => block_list_active,
            };
            if due {
                clear_session_keys(tx)?;
            }
            Ok(due)
        })
    }

    /// Store and activate a block list
    ///
    /// # Errors
    ///
    /// Returns an error if the write transaction fails
    pub fn set_block_list(&self, block_list: &[String]) -> Result<()> {
        self.with_tx(|tx| {
            put_value(tx, ACTIVE_BLOCK_LIST, block_list)?;
            put_value(tx, BLOCK_LIST_ACTIVE, &true)?;
            Ok(())
        })
    }

    /// Deactivate and empty the block list
    ///
    /// # Errors
    ///
    /// Returns an error if the write transaction fails
    pub fn clear_block_list(&self) -> Result<()> {
        self.with_tx(|tx| {
            put_value(tx, BLOCK_LIST_ACTIVE, &false)?;
            put_value(tx, ACTIVE_BLOCK_LIST, &Vec::<String>::new())?;
            Ok(())
        })
    }

    /// Store the most recent block explanation
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub fn set_last_block(&self, block: &LastBlock) -> Result<()> {
        self.with_conn(|conn| put_value(conn, LAST_BLOCK, block))
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or the stored value is corrupted
    pub fn get_last_block(&self) -> Result<Option<LastBlock>> {
        self.with_conn(|conn| get_value(conn, LAST_BLOCK))
    }

    /// # Errors
    ///
    /// Returns an error if the write fails
    pub fn set_last_notification(&self, notification: &Notification) -> Result<()> {
        self.with_conn(|conn| put_value(conn, LAST_NOTIFICATION, notification))
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or the stored value is corrupted
    pub fn get_last_notification(&self) -> Result<Option<Notification>> {
        self.with_conn(|conn| get_value(conn, LAST_NOTIFICATION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_database_has_no_session() {
        let db = Database::in_memory().unwrap();
        let state = db.load_session_state().unwrap();
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn test_save_session_overwrites_previous() {
        let db = Database::in_memory().unwrap();
        db.save_session(&Session::new("first".to_string(), Utc::now(), 60))
            .unwrap();
        let second = Session::new("second".to_string(), Utc::now(), 120);
        db.save_session(&second).unwrap();

        let loaded = db.load_session_state().unwrap().session.unwrap();
        assert_eq!(loaded.goal, "second");
        assert_eq!(loaded.id, second.id);
    }

    #[test]
    fn test_session_and_block_list_saved_together() {
        let db = Database::in_memory().unwrap();
        db.set_block_list(&["old.com".to_string()]).unwrap();
        let session = Session::new("thesis".to_string(), Utc::now(), 600);

        db.save_session_with_block_list(&session, &["reddit.com".to_string()])
            .unwrap();

        let state = db.load_session_state().unwrap();
        assert_eq!(state.session.unwrap().id, session.id);
        assert!(state.block_list_active);
        assert_eq!(state.block_list, vec!["reddit.com".to_string()]);
    }

    #[test]
    fn test_inactive_block_list_reads_empty() {
        let db = Database::in_memory().unwrap();
        db.set_block_list(&["x.com".to_string()]).unwrap();
        assert!(db.load_session_state().unwrap().block_list_active);

        db.clear_block_list().unwrap();
        let state = db.load_session_state().unwrap();
        assert!(!state.block_list_active);
        assert!(state.block_list.is_empty());
    }

    #[test]
    fn test_clear_session_state_is_idempotent() {
        let db = Database::in_memory().unwrap();
        db.save_session(&Session::new("focus".to_string(), Utc::now(), 60))
            .unwrap();
        db.set_block_list(&["tiktok.com".to_string()]).unwrap();

        assert!(db.clear_session_state().unwrap());
        let once = db.load_session_state().unwrap();

        assert!(!db.clear_session_state().unwrap());
        let twice = db.load_session_state().unwrap();

        assert_eq!(once, twice);
        assert!(twice.session.is_none());
        assert!(twice.block_list.is_empty());
    }

    #[test]
    fn test_clear_if_due_keeps_running_session() {
        let db = Database::in_memory().unwrap();
        let now = Utc::now();
        db.save_session(&Session::new("focus".to_string(), now, 60))
            .unwrap();
        db.set_block_list(&["tiktok.com".to_string()]).unwrap();

        assert!(!db.clear_session_state_if_due(now).unwrap());
        assert!(db.load_session_state().unwrap().session.is_some());

        assert!(db
            .clear_session_state_if_due(now + chrono::Duration::seconds(60))
            .unwrap());
        let state = db.load_session_state().unwrap();
        assert!(state.session.is_none());
        assert!(!state.block_list_active);
    }

    #[test]
    fn test_clear_if_due_drops_orphan_block_list() {
        let db = Database::in_memory().unwrap();
        db.set_block_list(&["reddit.com".to_string()]).unwrap();

        assert!(db.clear_session_state_if_due(Utc::now()).unwrap());
        assert!(db.load_session_state().unwrap().block_list.is_empty());
        assert!(!db.clear_session_state_if_due(Utc::now()).unwrap());
    }

    #[test]
    fn test_clear_session_state_keeps_last_block() {
        let db = Database::in_memory().unwrap();
        let block = LastBlock::new(
            "Cat video".to_string(),
            "https://youtube.com/watch?v=abc".to_string(),
            "off-topic".to_string(),
            "learn Rust".to_string(),
        );
        db.set_last_block(&block).unwrap();
        db.clear_session_state().unwrap();

        let loaded = db.get_last_block().unwrap().unwrap();
        assert_eq!(loaded.reason, "off-topic");
    }

    #[test]
    fn test_last_notification_round_trip() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_last_notification().unwrap().is_none());
        db.set_last_notification(&Notification::new("Session Complete!", "done"))
            .unwrap();
        assert_eq!(
            db.get_last_notification().unwrap().unwrap().title,
            "Session Complete!"
        );
    }
}
