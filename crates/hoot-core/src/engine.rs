use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use hoot_ai::roast::static_roast;
use hoot_ai::{ClassificationVerdict, VideoMetadata};
use hoot_storage::{Database, LastBlock, Notification, Session};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::block_surface::{BlockPage, ESCAPE_HATCH};
use crate::classifier_gateway::{ClassifierGateway, ServiceSource, StoredConfigSource};
use crate::config::Settings;
use crate::error::FocusError;
use crate::navigation_guard::{
    compose_block_list, NavigationDecision, NavigationEvent, NavigationGuard,
};
use crate::notifier::{
    Notifier, StoredNotifier, DEFAULT_TITLE, SESSION_COMPLETE_MESSAGE, SESSION_COMPLETE_TITLE,
};
use crate::scheduler::{DeadlineScheduler, ExpiryHandler, SchedulerState};
use crate::session_store::SessionStore;

pub const SITE_BLOCK_TITLE: &str = "Browsing distraction site";
pub const SITE_BLOCK_REASON: &str = "Full site block";
pub const NO_SESSION_REASON: &str = "No active focus session";

/// Effects of a session reaching its deadline
pub struct SessionExpiry {
    store: Arc<SessionStore>,
    gateway: Arc<ClassifierGateway>,
    notifier: Arc<dyn Notifier>,
}

impl SessionExpiry {
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        gateway: Arc<ClassifierGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
        }
    }

    /// Clear a session that ended by `cutoff`, forget its verdicts and
    /// announce it
    ///
    /// Only the run that actually clears something notifies, so running this
    /// twice has the same effect as running it once.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the clear fails
    pub fn run(&self, cutoff: DateTime<Utc>) -> Result<bool, FocusError> {
        let cleared = self.store.expire(cutoff)?;
        if cleared {
            self.gateway.reset();
            if let Err(e) = self
                .notifier
                .notify(SESSION_COMPLETE_TITLE, SESSION_COMPLETE_MESSAGE)
            {
                log::warn!("Failed to deliver completion notification: {e}");
            }
        }
        Ok(cleared)
    }
}

#[async_trait]
impl ExpiryHandler for SessionExpiry {
    async fn on_expire(&self, deadline: DateTime<Utc>) {
        if let Err(e) = self.run(deadline.max(Utc::now())) {
            log::error!("Session expiry failed: {e}");
        }
    }
}

/// Result of checking one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCheck {
    pub verdict: ClassificationVerdict,
    /// Block surface to send the tab to, when blocked
    pub redirect: Option<String>,
}

/// Snapshot shown by `hoot status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub session: Option<Session>,
    pub remaining_seconds: i64,
    pub block_list: Vec<String>,
    pub scheduler: SchedulerState,
    pub last_block: Option<LastBlock>,
    pub last_notification: Option<Notification>,
}

/// Owner of the session store, deadline scheduler, navigation guard and
/// classifier gateway
///
/// Lifecycle operations (start, end, alarms, block list changes,
/// reconciliation) are serialized; navigation and video checks only read.
pub struct FocusEngine {
    store: Arc<SessionStore>,
    scheduler: DeadlineScheduler,
    expiry: Arc<SessionExpiry>,
    guard: NavigationGuard,
    gateway: Arc<ClassifierGateway>,
    notifier: Arc<dyn Notifier>,
    settings: Settings,
    lifecycle: Mutex<()>,
}

impl FocusEngine {
    /// Open the engine on a database: self-heal stale state, then re-arm
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if storage is unavailable or the settings are unusable
    pub fn open(database: Arc<Database>, settings: Settings) -> Result<Self, FocusError> {
        let store = Arc::new(SessionStore::new(database.clone()));
        let notifier = Arc::new(StoredNotifier::new(store.clone()));
        let source = Arc::new(StoredConfigSource::new(database));
        let engine = Self::with_parts(store, settings, source, notifier)?;
        engine.recover_at(Utc::now())?;
        Ok(engine)
    }

    /// Assemble an engine without touching stored state
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the blocking settings are unusable
    pub fn with_parts(
        store: Arc<SessionStore>,
        settings: Settings,
        source: Arc<dyn ServiceSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, FocusError> {
        let guard = NavigationGuard::from_settings(&settings.blocking)?;
        let gateway = Arc::new(ClassifierGateway::new(
            source,
            settings.classifier.dedup_capacity,
            Duration::from_secs(settings.classifier.timeout_seconds),
        ));
        let expiry = Arc::new(SessionExpiry::new(
            store.clone(),
            gateway.clone(),
            notifier.clone(),
        ));
        let scheduler = DeadlineScheduler::new(expiry.clone());

        Ok(Self {
            store,
            scheduler,
            expiry,
            guard,
            gateway,
            notifier,
            settings,
            lifecycle: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    #[must_use]
    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Start a session, compute its block list and arm the deadline
    ///
    /// Session and block list become visible together; until then the
    /// previous state stays in force.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank goal or non-positive duration,
    /// `StorageUnavailable` if persisting fails
    pub async fn start_session(
        &self,
        goal: &str,
        duration_seconds: i64,
    ) -> Result<Session, FocusError> {
        let _lifecycle = self.lifecycle.lock().await;

        let pending = SessionStore::new_session(goal, duration_seconds, Utc::now())?;
        let block_list = self.build_block_list(&pending.goal).await;

        // The clock starts once the block list is ready
        let session = SessionStore::new_session(&pending.goal, duration_seconds, Utc::now())?;
        self.store.begin_session(&session, &block_list)?;
        self.gateway.reset();
        self.scheduler.arm(session.end_time);

        Ok(session)
    }

    /// Escape hatch: clear session, block list and alarm together
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the clear fails; the alarm stays armed then
    pub async fn end_session(&self) -> Result<bool, FocusError> {
        let _lifecycle = self.lifecycle.lock().await;

        let cleared = self.store.end_session()?;
        self.scheduler.disarm();
        self.gateway.reset();
        Ok(cleared)
    }

    /// Arm the deadline alarm at an epoch-millisecond timestamp
    ///
    /// Returns `false` if the timestamp is out of range.
    pub async fn schedule_alarm(&self, end_time_ms: i64) -> bool {
        let Some(deadline) = DateTime::from_timestamp_millis(end_time_ms) else {
            log::warn!("Ignoring alarm with out-of-range timestamp {end_time_ms}");
            return false;
        };
        let _lifecycle = self.lifecycle.lock().await;
        self.scheduler.arm(deadline);
        true
    }

    /// Recompute the block list for the running session
    ///
    /// Returns `false` when no session is running.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if storage fails
    pub async fn update_block_list(&self) -> Result<bool, FocusError> {
        let _lifecycle = self.lifecycle.lock().await;

        let Some(session) = self.store.active_session_at(Utc::now())? else {
            return Ok(false);
        };
        let block_list = self.build_block_list(&session.goal).await;
        self.store.set_block_list(&block_list)?;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the write fails
    pub async fn clear_block_list(&self) -> Result<bool, FocusError> {
        let _lifecycle = self.lifecycle.lock().await;
        self.store.clear_block_list()?;
        Ok(true)
    }

    async fn build_block_list(&self, goal: &str) -> Vec<String> {
        let mut entries = self.settings.blocking.baseline.clone();
        if self.settings.blocking.ai_extension {
            let extension = self.gateway.suggest_block_domains(goal).await;
            log::info!("AI suggested {} extra domains", extension.len());
            entries.extend(extension);
        }
        compose_block_list(entries.iter().map(String::as_str))
    }

    /// Decide a navigation; records the block when redirecting
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if storage fails
    pub fn check_navigation(
        &self,
        event: &NavigationEvent,
    ) -> Result<NavigationDecision, FocusError> {
        let now = Utc::now();
        let state = self.store.snapshot()?;
        let Some(session) = state.session.filter(|s| s.active && !s.is_expired(now)) else {
            return Ok(NavigationDecision::Allow);
        };

        let decision = self.guard.evaluate(event, &state.block_list);
        if let NavigationDecision::Redirect { .. } = &decision {
            self.store.record_block(&LastBlock::new(
                SITE_BLOCK_TITLE.to_string(),
                event.url.clone(),
                SITE_BLOCK_REASON.to_string(),
                session.goal,
            ))?;
        }
        Ok(decision)
    }

    /// Classify a video seen by `observer_id` against the session goal
    ///
    /// `goal` overrides the stored goal when given. Outside a session every
    /// video is allowed without asking the classifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty content id,
    /// `NavigationRaceCondition` for a duplicate in-flight request and
    /// `StorageUnavailable` if storage fails
    pub async fn analyze_video(
        &self,
        observer_id: &str,
        video: &VideoMetadata,
        goal: Option<&str>,
    ) -> Result<VideoCheck, FocusError> {
        if video.content_id.trim().is_empty() {
            return Err(FocusError::InvalidInput(
                "video content id must not be empty".to_string(),
            ));
        }
        let Some(session) = self.store.active_session_at(Utc::now())? else {
            return Ok(VideoCheck {
                verdict: ClassificationVerdict::allow(NO_SESSION_REASON),
                redirect: None,
            });
        };
        let goal = goal
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .unwrap_or(&session.goal);

        let verdict = self.gateway.classify_for(observer_id, video, goal).await?;
        if verdict.allowed() || !self.store.is_active()? {
            return Ok(VideoCheck {
                verdict,
                redirect: None,
            });
        }

        let url = video.url.clone().unwrap_or_else(|| {
            format!(
                "https://{}/watch?v={}",
                self.guard.video_host(),
                video.content_id
            )
        });
        self.store.record_block(&LastBlock::new(
            video.title.clone(),
            url,
            verdict.reason.clone(),
            goal.to_string(),
        ))?;
        let redirect = self.guard.surface().video_url(video, &verdict.reason);

        Ok(VideoCheck {
            verdict,
            redirect: Some(redirect),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the notification cannot be stored
    pub fn show_notification(&self, message: &str) -> Result<(), FocusError> {
        self.notifier.notify(DEFAULT_TITLE, message)
    }

    /// # Errors
    ///
    /// Returns `StorageUnavailable` if storage fails
    pub fn status(&self) -> Result<EngineStatus, FocusError> {
        let now = Utc::now();
        let state = self.store.snapshot()?;
        let remaining_seconds = state
            .session
            .as_ref()
            .filter(|s| s.active)
            .map_or(0, |s| s.remaining(now).num_seconds());

        Ok(EngineStatus {
            session: state.session,
            remaining_seconds,
            block_list: state.block_list,
            scheduler: self.scheduler.state(),
            last_block: self.store.last_block()?,
            last_notification: self.store.last_notification()?,
        })
    }

    /// Content of the block surface: last block, time left and a roast
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if storage fails
    pub async fn block_page(&self) -> Result<BlockPage, FocusError> {
        let now = Utc::now();
        let last_block = self.store.last_block()?;
        let session = self.store.active_session_at(now)?;

        let goal = session
            .as_ref()
            .map(|s| s.goal.clone())
            .or_else(|| last_block.as_ref().map(|b| b.goal.clone()));
        let remaining_seconds = session.map_or(0, |s| s.remaining(now).num_seconds());
        let seed = usize::try_from(now.timestamp().rem_euclid(1024)).unwrap_or_default();

        let roast = match (&goal, &last_block) {
            (Some(goal), Some(block)) => {
                let time_of_day = now.with_timezone(&Local).format("%H:%M").to_string();
                self.gateway
                    .roast(goal, &block.title, None, &time_of_day, seed)
                    .await
            }
            _ => static_roast(seed).to_string(),
        };

        Ok(BlockPage {
            last_block,
            goal,
            remaining_seconds,
            roast,
            escape_hatch: ESCAPE_HATCH.to_string(),
        })
    }

    /// Startup recovery: clear a session that ended while nothing was running,
    /// then re-arm the alarm for a live one
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if storage fails
    pub fn recover_at(&self, now: DateTime<Utc>) -> Result<bool, FocusError> {
        let recovered = self.expiry.run(now)?;
        if let Some(session) = self.store.active_session_at(now)? {
            log::info!("Resuming session '{}' until {}", session.goal, session.end_time);
            self.scheduler.arm(session.end_time);
        }
        Ok(recovered)
    }

    /// Compare the stored deadline with wall-clock time
    ///
    /// Catches deadlines the monotonic timer missed (suspend/resume) and
    /// keeps the alarm in step with the stored session. Returns `true` if a
    /// session was expired here.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if storage fails
    pub async fn reconcile(&self, now: DateTime<Utc>) -> Result<bool, FocusError> {
        let _lifecycle = self.lifecycle.lock().await;

        if self.expiry.run(now)? {
            log::info!("Deadline passed without the timer firing, session cleared");
            self.scheduler.disarm();
            return Ok(true);
        }

        if let Some(session) = self.store.active_session_at(now)? {
            if self.scheduler.armed_deadline() != Some(session.end_time) {
                log::debug!("Re-arming alarm for {}", session.end_time);
                self.scheduler.arm(session.end_time);
            }
        }
        Ok(false)
    }
}
