use hoot_ai::roast::{fallback_video_roast, static_roast};
use hoot_ai::{AiService, ClassificationVerdict, ClassifierError, VideoMetadata};
use hoot_storage::Database;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::FocusError;

const DEFAULT_OBSERVER_CAPACITY: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(v) => v,
    None => unreachable!(),
};

/// Builds an [`AiService`] for each request so configuration changes apply immediately
pub trait ServiceSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `Disabled` or `MissingApiKey` when no classifier can be built
    fn service(&self) -> Result<AiService, ClassifierError>;
}

/// Reads the AI configuration row from the database
pub struct StoredConfigSource {
    database: Arc<Database>,
}

impl StoredConfigSource {
    #[must_use]
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }
}

impl ServiceSource for StoredConfigSource {
    fn service(&self) -> Result<AiService, ClassifierError> {
        let config = self
            .database
            .get_ai_config()
            .map_err(|e| ClassifierError::Unavailable(format!("reading AI config: {e:#}")))?;
        AiService::new(&config)
    }
}

#[derive(Debug, Clone)]
enum ObserverSlot {
    Pending(String),
    Delivered {
        content_id: String,
        verdict: ClassificationVerdict,
    },
}

type Observers = Mutex<LruCache<String, ObserverSlot>>;

fn lock(observers: &Observers) -> MutexGuard<'_, LruCache<String, ObserverSlot>> {
    observers.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases a pending slot if the request is dropped before it completes
struct PendingSlot<'a> {
    observers: &'a Observers,
    observer_id: &'a str,
    content_id: &'a str,
    armed: bool,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut observers = lock(self.observers);
        let still_pending = matches!(
            observers.peek(self.observer_id),
            Some(ObserverSlot::Pending(id)) if id == self.content_id
        );
        if still_pending {
            observers.pop(self.observer_id);
        }
    }
}

/// Gateway to the remote classifier
///
/// Never blocks on a broken classifier: every failure becomes an allow
/// verdict. Per observer (tab) it remembers the current content id so the
/// same video is not classified twice.
pub struct ClassifierGateway {
    source: Arc<dyn ServiceSource>,
    observers: Observers,
    timeout: Duration,
}

impl ClassifierGateway {
    #[must_use]
    pub fn new(source: Arc<dyn ServiceSource>, capacity: usize, timeout: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_OBSERVER_CAPACITY);
        Self {
            source,
            observers: Mutex::new(LruCache::new(capacity)),
            timeout,
        }
    }

    /// Classify without de-duplication. Never fails.
    pub async fn classify(&self, video: &VideoMetadata, goal: &str) -> ClassificationVerdict {
        let service = match self.source.service() {
            Ok(service) => service,
            Err(e) => {
                log::warn!("Classifier unavailable ({e}), allowing '{}'", video.title);
                return ClassificationVerdict::fail_open();
            }
        };

        match tokio::time::timeout(self.timeout, service.analyze_video(video, goal)).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                log::warn!("Classification of '{}' failed: {e}", video.title);
                ClassificationVerdict::fail_open()
            }
            Err(_) => {
                log::warn!(
                    "Classification of '{}' timed out after {:?}",
                    video.title,
                    self.timeout
                );
                ClassificationVerdict::fail_open()
            }
        }
    }

    /// Classify content reported by one observer
    ///
    /// The same content id while a request is in flight is rejected; once
    /// delivered, the remembered verdict is returned without a new request.
    ///
    /// # Errors
    ///
    /// Returns `NavigationRaceCondition` for a duplicate of an in-flight request
    pub async fn classify_for(
        &self,
        observer_id: &str,
        video: &VideoMetadata,
        goal: &str,
    ) -> Result<ClassificationVerdict, FocusError> {
        let content_id = video.content_id.as_str();
        {
            let mut observers = lock(&self.observers);
            match observers.get(observer_id) {
                Some(ObserverSlot::Pending(id)) if id == content_id => {
                    log::debug!("Suppressing duplicate classification of {content_id}");
                    return Err(FocusError::NavigationRaceCondition(content_id.to_string()));
                }
                Some(ObserverSlot::Delivered {
                    content_id: id,
                    verdict,
                }) if id == content_id => {
                    log::debug!("Reusing verdict for {content_id} on observer {observer_id}");
                    return Ok(verdict.clone());
                }
                _ => {}
            }
            observers.put(
                observer_id.to_string(),
                ObserverSlot::Pending(content_id.to_string()),
            );
        }

        let mut pending = PendingSlot {
            observers: &self.observers,
            observer_id,
            content_id,
            armed: true,
        };
        let verdict = self.classify(video, goal).await;
        pending.armed = false;

        let mut observers = lock(&self.observers);
        let still_current = matches!(
            observers.peek(observer_id),
            Some(ObserverSlot::Pending(id)) if id == content_id
        );
        if still_current {
            observers.put(
                observer_id.to_string(),
                ObserverSlot::Delivered {
                    content_id: content_id.to_string(),
                    verdict: verdict.clone(),
                },
            );
        }
        Ok(verdict)
    }

    /// Drop the memory of one observer (tab closed)
    pub fn forget(&self, observer_id: &str) {
        lock(&self.observers).pop(observer_id);
    }

    /// Drop all remembered verdicts; they belong to the previous goal
    pub fn reset(&self) {
        lock(&self.observers).clear();
    }

    /// Extra domains likely to distract from `goal`; empty on any failure
    pub async fn suggest_block_domains(&self, goal: &str) -> Vec<String> {
        let service = match self.source.service() {
            Ok(service) => service,
            Err(e) => {
                log::debug!("Skipping AI block list extension: {e}");
                return Vec::new();
            }
        };
        match tokio::time::timeout(self.timeout, service.suggest_distracting_domains(goal)).await {
            Ok(Ok(domains)) => domains,
            Ok(Err(e)) => {
                log::warn!("AI block list extension failed: {e}");
                Vec::new()
            }
            Err(_) => {
                log::warn!("AI block list extension timed out");
                Vec::new()
            }
        }
    }

    /// Roast for the block surface; falls back to a canned one when the model is unavailable
    pub async fn roast(
        &self,
        goal: &str,
        title: &str,
        channel: Option<&str>,
        time_of_day: &str,
        seed: usize,
    ) -> String {
        let Ok(service) = self.source.service() else {
            return static_roast(seed).to_string();
        };
        match tokio::time::timeout(
            self.timeout,
            service.generate_roast(goal, title, channel, time_of_day),
        )
        .await
        {
            Ok(Ok(roast)) => roast,
            Ok(Err(e)) => {
                log::warn!("Roast generation failed: {e}");
                fallback_video_roast(goal, title)
            }
            Err(_) => fallback_video_roast(goal, title),
        }
    }
}

#[cfg(test)]
mod tests;
