use chrono::{DateTime, Duration, SubsecRound, Utc};
use hoot_storage::{Database, LastBlock, Notification, Session, SessionState};
use std::sync::Arc;

use crate::error::FocusError;

fn log_started(session: &Session) {
    log::info!(
        "Session {} started: '{}' until {}",
        session.id,
        session.goal,
        session.end_time
    );
}

/// Persisted owner of the current session and block list
///
/// The database is the only source of truth: every read goes to storage, and
/// every write is one transaction.
pub struct SessionStore {
    database: Arc<Database>,
}

impl SessionStore {
    /// Wrap a database without touching its contents
    #[must_use]
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Open the store and clear a session whose deadline already passed
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the recovery write fails
    pub fn open(database: Arc<Database>) -> Result<Self, FocusError> {
        let store = Self::new(database);
        store.recover(Utc::now())?;
        Ok(store)
    }

    #[must_use]
    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    /// Start a session now, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank goal or a non-positive duration,
    /// `StorageUnavailable` if the write fails
    pub fn start_session(&self, goal: &str, duration_seconds: i64) -> Result<Session, FocusError> {
        self.start_session_at(goal, duration_seconds, Utc::now())
    }

    /// Start a session at an explicit instant
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank goal or a non-positive duration,
    /// `StorageUnavailable` if the write fails
    pub fn start_session_at(
        &self,
        goal: &str,
        duration_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<Session, FocusError> {
        let session = Self::new_session(goal, duration_seconds, now)?;
        self.database
            .save_session(&session)
            .map_err(|e| FocusError::storage(&e))?;
        log_started(&session);
        Ok(session)
    }

    /// Validate the input and build a session starting at `now` without
    /// storing it
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank goal, a non-positive duration or a
    /// deadline out of range
    pub fn new_session(
        goal: &str,
        duration_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<Session, FocusError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(FocusError::InvalidInput("goal must not be empty".to_string()));
        }
        if duration_seconds <= 0 {
            return Err(FocusError::InvalidInput(format!(
                "duration must be positive, got {duration_seconds}s"
            )));
        }
        Duration::try_seconds(duration_seconds)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| {
                FocusError::InvalidInput(format!("duration of {duration_seconds}s is too large"))
            })?;

        // Storage keeps millisecond precision
        Ok(Session::new(
            goal.to_string(),
            now.trunc_subsecs(3),
            duration_seconds,
        ))
    }

    /// Store `session` and activate `block_list` in one transaction,
    /// replacing any previous session
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the write fails; the previous state is
    /// kept then
    pub fn begin_session(
        &self,
        session: &Session,
        block_list: &[String],
    ) -> Result<(), FocusError> {
        self.database
            .save_session_with_block_list(session, block_list)
            .map_err(|e| FocusError::storage(&e))?;
        log_started(session);
        Ok(())
    }

    /// Clear session and block list unconditionally
    ///
    /// Returns `true` if something was running.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the write fails
    pub fn end_session(&self) -> Result<bool, FocusError> {
        let cleared = self
            .database
            .clear_session_state()
            .map_err(|e| FocusError::storage(&e))?;
        if cleared {
            log::info!("Session ended");
        }
        Ok(cleared)
    }

    /// Clear session and block list if the session ended by `cutoff`
    ///
    /// Running this twice leaves the same state as running it once; the second
    /// call reports `false`.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the write fails
    pub fn expire(&self, cutoff: DateTime<Utc>) -> Result<bool, FocusError> {
        let cleared = self
            .database
            .clear_session_state_if_due(cutoff)
            .map_err(|e| FocusError::storage(&e))?;
        if cleared {
            log::info!("Session expired at {cutoff}");
        }
        Ok(cleared)
    }

    /// Self-heal after a restart: drop state whose deadline is in the past
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the read or write fails
    pub fn recover(&self, now: DateTime<Utc>) -> Result<bool, FocusError> {
        let recovered = self.expire(now)?;
        if recovered {
            log::info!("Recovered from a session that ended while hoot was not running");
        }
        Ok(recovered)
    }

    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the read fails
    pub fn snapshot(&self) -> Result<SessionState, FocusError> {
        self.database
            .load_session_state()
            .map_err(|e| FocusError::storage(&e))
    }

    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the read fails
    pub fn get_session(&self) -> Result<Option<Session>, FocusError> {
        Ok(self.snapshot()?.session)
    }

    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the read fails
    pub fn is_active(&self) -> Result<bool, FocusError> {
        self.is_active_at(Utc::now())
    }

    /// A session counts as active only while running and before its deadline
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the read fails
    pub fn is_active_at(&self, now: DateTime<Utc>) -> Result<bool, FocusError> {
        Ok(self.active_session_at(now)?.is_some())
    }

    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the read fails
    pub fn active_session_at(&self, now: DateTime<Utc>) -> Result<Option<Session>, FocusError> {
        Ok(self
            .get_session()?
            .filter(|s| s.active && !s.is_expired(now)))
    }

    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the write fails
    pub fn set_block_list(&self, block_list: &[String]) -> Result<(), FocusError> {
        self.database
            .set_block_list(block_list)
            .map_err(|e| FocusError::storage(&e))?;
        log::debug!("Block list activated with {} domains", block_list.len());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the write fails
    pub fn clear_block_list(&self) -> Result<(), FocusError> {
        self.database
            .clear_block_list()
            .map_err(|e| FocusError::storage(&e))
    }

    /// Active block list; empty when blocking is off
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the read fails
    pub fn active_block_list(&self) -> Result<Vec<String>, FocusError> {
        Ok(self.snapshot()?.block_list)
    }

    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the write fails
    pub fn record_block(&self, block: &LastBlock) -> Result<(), FocusError> {
        self.database
            .set_last_block(block)
            .map_err(|e| FocusError::storage(&e))
    }

    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the read fails
    pub fn last_block(&self) -> Result<Option<LastBlock>, FocusError> {
        self.database
            .get_last_block()
            .map_err(|e| FocusError::storage(&e))
    }

    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the write fails
    pub fn record_notification(&self, notification: &Notification) -> Result<(), FocusError> {
        self.database
            .set_last_notification(notification)
            .map_err(|e| FocusError::storage(&e))
    }

    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the read fails
    pub fn last_notification(&self) -> Result<Option<Notification>, FocusError> {
        self.database
            .get_last_notification()
            .map_err(|e| FocusError::storage(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(Database::in_memory().unwrap()))
    }

    fn at(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, min, sec).unwrap()
    }

    #[test]
    fn test_start_session_persists_exact_duration() {
        let store = store();
        for duration in [1, 59, 1500, 86_400, 7 * 86_400] {
            let started = store.start_session_at("learn Rust", duration, at(9, 0, 0)).unwrap();
            let loaded = store.get_session().unwrap().unwrap();

            assert_eq!(loaded, started);
            assert_eq!(loaded.duration().num_seconds(), duration);
            assert!(loaded.active);
        }
    }

    #[test]
    fn test_new_session_stores_nothing_until_begun() {
        let store = store();
        let session = SessionStore::new_session("learn Rust", 600, at(9, 0, 0)).unwrap();
        assert!(store.get_session().unwrap().is_none());
        assert!(SessionStore::new_session(" ", 600, at(9, 0, 0)).is_err());

        store
            .begin_session(&session, &["instagram.com".to_string()])
            .unwrap();

        let state = store.snapshot().unwrap();
        assert_eq!(state.session, Some(session));
        assert_eq!(state.block_list, vec!["instagram.com".to_string()]);
    }

    #[test]
    fn test_start_session_trims_goal() {
        let store = store();
        let session = store.start_session("  write thesis \n", 60).unwrap();
        assert_eq!(session.goal, "write thesis");
    }

    #[test]
    fn test_invalid_input_persists_nothing() {
        let store = store();
        for (goal, duration) in [("", 60), ("   ", 60), ("focus", 0), ("focus", -5)] {
            let err = store.start_session(goal, duration).unwrap_err();
            assert!(matches!(err, FocusError::InvalidInput(_)), "{goal:?} {duration}");
        }
        assert!(store.get_session().unwrap().is_none());
        assert!(!store.is_active().unwrap());
    }

    #[test]
    fn test_huge_duration_is_invalid() {
        let store = store();
        let err = store.start_session("focus", i64::MAX).unwrap_err();
        assert!(matches!(err, FocusError::InvalidInput(_)));
        assert!(store.get_session().unwrap().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let store = store();
        store.start_session_at("first", 60, at(9, 0, 0)).unwrap();
        let second = store.start_session_at("second", 120, at(9, 0, 30)).unwrap();
        assert_eq!(store.get_session().unwrap().unwrap().id, second.id);
    }

    #[test]
    fn test_is_active_requires_future_deadline() {
        let store = store();
        store.start_session_at("focus", 60, at(9, 0, 0)).unwrap();

        assert!(store.is_active_at(at(9, 0, 59)).unwrap());
        assert!(!store.is_active_at(at(9, 1, 0)).unwrap());
    }

    #[test]
    fn test_end_session_clears_block_list() {
        let store = store();
        store.start_session("focus", 60).unwrap();
        store.set_block_list(&["reddit.com".to_string()]).unwrap();

        assert!(store.end_session().unwrap());
        assert!(store.get_session().unwrap().is_none());
        assert!(store.active_block_list().unwrap().is_empty());
        assert!(!store.end_session().unwrap());
    }

    #[test]
    fn test_expire_twice_matches_once() {
        let store = store();
        store.start_session_at("focus", 60, at(9, 0, 0)).unwrap();
        store.set_block_list(&["reddit.com".to_string()]).unwrap();

        assert!(store.expire(at(9, 1, 0)).unwrap());
        let once = store.snapshot().unwrap();
        assert!(!store.expire(at(9, 1, 0)).unwrap());
        let twice = store.snapshot().unwrap();

        assert_eq!(once, twice);
        assert!(twice.session.is_none());
        assert!(twice.block_list.is_empty());
        assert!(!twice.block_list_active);
    }

    #[test]
    fn test_expire_keeps_session_before_deadline() {
        let store = store();
        store.start_session_at("focus", 60, at(9, 0, 0)).unwrap();
        assert!(!store.expire(at(9, 0, 30)).unwrap());
        assert!(store.get_session().unwrap().is_some());
    }

    #[test]
    fn test_open_recovers_stale_session() {
        let database = Arc::new(Database::in_memory().unwrap());
        let stale = SessionStore::new(database.clone());
        stale
            .start_session_at("focus", 60, Utc::now() - Duration::hours(2))
            .unwrap();
        stale.set_block_list(&["tiktok.com".to_string()]).unwrap();

        let store = SessionStore::open(database).unwrap();

        assert!(store.get_session().unwrap().is_none());
        assert!(store.active_block_list().unwrap().is_empty());
    }

    #[test]
    fn test_open_keeps_running_session() {
        let database = Arc::new(Database::in_memory().unwrap());
        SessionStore::new(database.clone())
            .start_session("focus", 3600)
            .unwrap();

        let store = SessionStore::open(database).unwrap();
        assert!(store.is_active().unwrap());
    }

    #[test]
    fn test_last_block_survives_session_end() {
        let store = store();
        store.start_session("focus", 60).unwrap();
        store
            .record_block(&LastBlock::new(
                "Browsing distraction site".to_string(),
                "https://reddit.com".to_string(),
                "Full site block".to_string(),
                "focus".to_string(),
            ))
            .unwrap();
        store.end_session().unwrap();

        assert_eq!(
            store.last_block().unwrap().unwrap().url,
            "https://reddit.com"
        );
    }
}
