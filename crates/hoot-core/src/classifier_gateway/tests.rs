use super::*;
use async_trait::async_trait;
use hoot_ai::verdict::FAIL_OPEN_REASON;
use hoot_ai::{AiProviderTrait, Decision};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

// ============================================================================
// Scripted classifier
// ============================================================================

struct Script {
    reply: Result<String, ClassifierError>,
    calls: AtomicUsize,
    /// When set, every request waits for a permit before answering
    gate: Option<Semaphore>,
}

struct ScriptedProvider(Arc<Script>);

#[async_trait]
impl AiProviderTrait for ScriptedProvider {
    async fn generate(
        &self,
        _prompt: &str,
        _max_output_tokens: Option<u32>,
    ) -> Result<String, ClassifierError> {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.0.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        self.0.reply.clone()
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedSource(Arc<Script>);

impl ServiceSource for ScriptedSource {
    fn service(&self) -> Result<AiService, ClassifierError> {
        Ok(AiService::with_provider(Box::new(ScriptedProvider(
            self.0.clone(),
        ))))
    }
}

struct NoKeySource;

impl ServiceSource for NoKeySource {
    fn service(&self) -> Result<AiService, ClassifierError> {
        Err(ClassifierError::MissingApiKey)
    }
}

fn script(reply: Result<&str, ClassifierError>, gated: bool) -> Arc<Script> {
    Arc::new(Script {
        reply: reply.map(str::to_string),
        calls: AtomicUsize::new(0),
        gate: gated.then(|| Semaphore::new(0)),
    })
}

fn gateway(script: &Arc<Script>) -> ClassifierGateway {
    ClassifierGateway::new(
        Arc::new(ScriptedSource(script.clone())),
        8,
        Duration::from_secs(5),
    )
}

fn video(id: &str) -> VideoMetadata {
    VideoMetadata {
        content_id: id.to_string(),
        title: format!("Video {id}"),
        channel: Some("Channel".to_string()),
        description: None,
        url: Some(format!("https://youtube.com/watch?v={id}")),
    }
}

const BLOCK_REPLY: &str = r#"{"decision":"block","reason":"off-topic"}"#;

// ============================================================================
// Fail-open classification
// ============================================================================

#[tokio::test]
async fn test_block_verdict() {
    let script = script(Ok(BLOCK_REPLY), false);
    let verdict = gateway(&script).classify(&video("abc"), "learn Rust").await;

    assert_eq!(verdict.decision, Decision::Block);
    assert_eq!(verdict.reason, "off-topic");
}

#[tokio::test]
async fn test_transport_error_fails_open() {
    let script = script(Err(ClassifierError::Unavailable("reset".to_string())), false);
    let verdict = gateway(&script).classify(&video("abc"), "learn Rust").await;

    assert!(verdict.allowed());
    assert_eq!(verdict.reason, FAIL_OPEN_REASON);
}

#[tokio::test]
async fn test_non_json_fails_open() {
    let script = script(Ok("I would block this, honestly."), false);
    let verdict = gateway(&script).classify(&video("abc"), "learn Rust").await;

    assert_eq!(verdict, ClassificationVerdict::fail_open());
}

#[tokio::test]
async fn test_missing_key_fails_open() {
    let gateway = ClassifierGateway::new(Arc::new(NoKeySource), 8, Duration::from_secs(5));
    let verdict = gateway.classify(&video("abc"), "learn Rust").await;

    assert!(verdict.allowed());
}

#[tokio::test]
async fn test_timeout_fails_open() {
    let script = script(Ok(BLOCK_REPLY), true);
    let gateway = ClassifierGateway::new(
        Arc::new(ScriptedSource(script.clone())),
        8,
        Duration::from_millis(20),
    );

    let verdict = gateway.classify(&video("abc"), "learn Rust").await;
    assert_eq!(verdict, ClassificationVerdict::fail_open());
}

// ============================================================================
// Per-observer de-duplication
// ============================================================================

#[tokio::test]
async fn test_delivered_verdict_is_reused() {
    let script = script(Ok(BLOCK_REPLY), false);
    let gateway = gateway(&script);

    let first = gateway
        .classify_for("tab-1", &video("abc"), "learn Rust")
        .await
        .unwrap();
    let second = gateway
        .classify_for("tab-1", &video("abc"), "learn Rust")
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(script.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_pending_duplicate_is_suppressed() {
    let script = script(Ok(BLOCK_REPLY), true);
    let gateway = Arc::new(gateway(&script));

    let first = {
        let gateway = gateway.clone();
        tokio::spawn(async move {
            gateway
                .classify_for("tab-1", &video("abc"), "learn Rust")
                .await
        })
    };
    while script.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    let duplicate = gateway
        .classify_for("tab-1", &video("abc"), "learn Rust")
        .await;
    assert!(matches!(
        duplicate,
        Err(FocusError::NavigationRaceCondition(id)) if id == "abc"
    ));

    script.gate.as_ref().unwrap().add_permits(1);
    let verdict = first.await.unwrap().unwrap();
    assert_eq!(verdict.decision, Decision::Block);
    assert_eq!(script.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_new_content_replaces_memory() {
    let script = script(Ok(BLOCK_REPLY), false);
    let gateway = gateway(&script);

    gateway.classify_for("tab-1", &video("abc"), "g").await.unwrap();
    gateway.classify_for("tab-1", &video("def"), "g").await.unwrap();
    gateway.classify_for("tab-1", &video("abc"), "g").await.unwrap();

    assert_eq!(script.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_observers_are_independent() {
    let script = script(Ok(BLOCK_REPLY), false);
    let gateway = gateway(&script);

    gateway.classify_for("tab-1", &video("abc"), "g").await.unwrap();
    gateway.classify_for("tab-2", &video("abc"), "g").await.unwrap();

    assert_eq!(script.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_reset_and_forget_clear_memory() {
    let script = script(Ok(BLOCK_REPLY), false);
    let gateway = gateway(&script);

    gateway.classify_for("tab-1", &video("abc"), "g").await.unwrap();
    gateway.forget("tab-1");
    gateway.classify_for("tab-1", &video("abc"), "g").await.unwrap();
    gateway.reset();
    gateway.classify_for("tab-1", &video("abc"), "g").await.unwrap();

    assert_eq!(script.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_cancelled_request_releases_slot() {
    let script = script(Ok(BLOCK_REPLY), true);
    let gateway = gateway(&script);

    let cancelled = tokio::time::timeout(
        Duration::from_millis(20),
        gateway.classify_for("tab-1", &video("abc"), "g"),
    )
    .await;
    assert!(cancelled.is_err());

    script.gate.as_ref().unwrap().add_permits(1);
    let verdict = gateway.classify_for("tab-1", &video("abc"), "g").await.unwrap();
    assert_eq!(verdict.decision, Decision::Block);
}

// ============================================================================
// Block list extension and roasts
// ============================================================================

#[tokio::test]
async fn test_suggestions_fail_open_to_empty() {
    let script = script(Ok("no idea"), false);
    assert!(gateway(&script).suggest_block_domains("study").await.is_empty());

    let gateway = ClassifierGateway::new(Arc::new(NoKeySource), 8, Duration::from_secs(5));
    assert!(gateway.suggest_block_domains("study").await.is_empty());
}

#[tokio::test]
async fn test_roast_falls_back() {
    let gateway = ClassifierGateway::new(Arc::new(NoKeySource), 8, Duration::from_secs(5));
    let roast = gateway.roast("learn Rust", "Cats", None, "10:00", 3).await;
    assert_eq!(roast, static_roast(3));

    let script = script(Err(ClassifierError::Unavailable("down".to_string())), false);
    let roast = gateway_roast(&script).await;
    assert_eq!(roast, fallback_video_roast("learn Rust", "Cats"));
}

async fn gateway_roast(script: &Arc<Script>) -> String {
    gateway(script)
        .roast("learn Rust", "Cats", Some("CatTube"), "10:00", 0)
        .await
}
