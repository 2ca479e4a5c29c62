use hoot_storage::Notification;
use std::sync::Arc;

use crate::error::FocusError;
use crate::session_store::SessionStore;

pub const SESSION_COMPLETE_TITLE: &str = "Session Complete!";
pub const SESSION_COMPLETE_MESSAGE: &str = "Great job staying focused! Your session has ended.";
pub const DEFAULT_TITLE: &str = "Focus Hoot";

/// Sink for user-visible notifications
pub trait Notifier: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the notification could not be delivered
    fn notify(&self, title: &str, message: &str) -> Result<(), FocusError>;
}

/// Persists the latest notification so `hoot status` can show it, and logs it
pub struct StoredNotifier {
    store: Arc<SessionStore>,
}

impl StoredNotifier {
    #[must_use]
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

impl Notifier for StoredNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), FocusError> {
        log::info!("Notification: {title} - {message}");
        self.store
            .record_notification(&Notification::new(title, message))
    }
}
