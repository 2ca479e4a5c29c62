//! Site blocking decisions for navigations.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::block_surface::BlockSurface;
use crate::config::BlockingSettings;
use crate::error::FocusError;

/// Short-link hosts that belong to a video host
const SHORT_LINKS: &[(&str, &str)] = &[("youtube.com", "youtu.be")];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationKind {
    /// Full page load committed in a tab
    Committed,
    /// In-page history change (single-page apps)
    HistoryStateUpdated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEvent {
    pub url: String,
    pub kind: NavigationKind,
}

impl NavigationEvent {
    #[must_use]
    pub fn new(url: &str, kind: NavigationKind) -> Self {
        Self {
            url: url.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationDecision {
    Allow,
    /// Send the tab to the block surface
    Redirect { domain: String, to: String },
    /// Video host: the content classifier decides
    Delegate { video_id: Option<String> },
}

fn parse_lenient(input: &str) -> Option<Url> {
    let input = input.trim();
    match Url::parse(input) {
        Ok(url) if url.host_str().is_some() => Some(url),
        _ => Url::parse(&format!("https://{input}")).ok(),
    }
}

fn canonical_host(host: &str) -> Option<String> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    (!host.is_empty()).then(|| host.to_string())
}

/// Normalized host of a URL, or of a bare `host/path` string
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    let parsed = parse_lenient(url)?;
    canonical_host(parsed.host_str()?)
}

/// Normalize a block list entry; accepts bare domains and full URLs
#[must_use]
pub fn normalize_domain(entry: &str) -> Option<String> {
    if entry.trim().is_empty() {
        return None;
    }
    host_of(entry)
}

/// `host` equals `domain` or is one of its subdomains
#[must_use]
pub fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Normalize and de-duplicate block list entries, keeping first-seen order
#[must_use]
pub fn compose_block_list<'a, I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut list: Vec<String> = Vec::new();
    for domain in entries.into_iter().filter_map(normalize_domain) {
        if !list.contains(&domain) {
            list.push(domain);
        }
    }
    list
}

/// Decides whether a navigation is blocked
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    video_host: String,
    short_link: Option<String>,
    surface: BlockSurface,
}

impl NavigationGuard {
    /// # Errors
    ///
    /// Returns `InvalidInput` if the video host is empty or the block page is not a URL
    pub fn new(video_host: &str, block_page: &str) -> Result<Self, FocusError> {
        let video_host = normalize_domain(video_host)
            .ok_or_else(|| FocusError::InvalidInput("video host must not be empty".to_string()))?;
        let short_link = SHORT_LINKS
            .iter()
            .find(|(host, _)| *host == video_host)
            .map(|(_, short)| (*short).to_string());

        Ok(Self {
            video_host,
            short_link,
            surface: BlockSurface::new(block_page)?,
        })
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` if the configured hosts are unusable
    pub fn from_settings(settings: &BlockingSettings) -> Result<Self, FocusError> {
        Self::new(&settings.video_host, &settings.block_page)
    }

    #[must_use]
    pub fn surface(&self) -> &BlockSurface {
        &self.surface
    }

    #[must_use]
    pub fn video_host(&self) -> &str {
        &self.video_host
    }

    fn is_video_host(&self, host: &str) -> bool {
        host_matches(host, &self.video_host)
            || self.short_link.as_deref().is_some_and(|short| host == short)
    }

    /// First block list entry covering the URL's host
    #[must_use]
    pub fn matched_domain(&self, url: &str, block_list: &[String]) -> Option<String> {
        let host = host_of(url)?;
        if self.is_video_host(&host) {
            return None;
        }
        block_list
            .iter()
            .filter_map(|entry| normalize_domain(entry))
            .find(|domain| host_matches(&host, domain))
    }

    #[must_use]
    pub fn should_block(&self, url: &str, block_list: &[String]) -> bool {
        self.matched_domain(url, block_list).is_some()
    }

    /// Content id of a video URL on the video host
    #[must_use]
    pub fn video_id(&self, url: &str) -> Option<String> {
        let parsed = parse_lenient(url)?;
        let host = canonical_host(parsed.host_str()?)?;

        if self.short_link.as_deref() == Some(host.as_str()) {
            return parsed
                .path_segments()?
                .next()
                .filter(|id| !id.is_empty())
                .map(str::to_string);
        }
        if !host_matches(&host, &self.video_host) {
            return None;
        }
        if parsed.path() == "/watch" {
            return parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, id)| id.into_owned())
                .filter(|id| !id.is_empty());
        }
        let mut segments = parsed.path_segments()?;
        match (segments.next(), segments.next()) {
            (Some("shorts"), Some(id)) if !id.is_empty() => Some(id.to_string()),
            _ => None,
        }
    }

    /// Decide what to do with a navigation while `block_list` is active
    #[must_use]
    pub fn evaluate(&self, event: &NavigationEvent, block_list: &[String]) -> NavigationDecision {
        let Some(host) = host_of(&event.url) else {
            return NavigationDecision::Allow;
        };

        if self.is_video_host(&host) {
            return NavigationDecision::Delegate {
                video_id: self.video_id(&event.url),
            };
        }

        match self.matched_domain(&event.url, block_list) {
            Some(domain) => {
                log::info!("Blocking {:?} navigation to {} ({domain})", event.kind, event.url);
                let to = self.surface.site_url(&domain);
                NavigationDecision::Redirect { domain, to }
            }
            None => NavigationDecision::Allow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BASELINE;

    fn guard() -> NavigationGuard {
        NavigationGuard::new("youtube.com", "hoot://block").unwrap()
    }

    fn baseline() -> Vec<String> {
        compose_block_list(DEFAULT_BASELINE.iter().copied())
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("Instagram.com"), Some("instagram.com".to_string()));
        assert_eq!(normalize_domain("www.reddit.com."), Some("reddit.com".to_string()));
        assert_eq!(
            normalize_domain("https://www.TikTok.com/@someone?x=1"),
            Some("tiktok.com".to_string())
        );
        assert_eq!(normalize_domain("localhost:3000"), Some("localhost".to_string()));
        assert_eq!(normalize_domain("   "), None);
    }

    #[test]
    fn test_host_matches_only_on_label_boundary() {
        assert!(host_matches("reddit.com", "reddit.com"));
        assert!(host_matches("old.reddit.com", "reddit.com"));
        assert!(!host_matches("notreddit.com", "reddit.com"));
        assert!(!host_matches("reddit.com.evil.io", "reddit.com"));
    }

    #[test]
    fn test_should_block_subdomains_and_www() {
        let guard = guard();
        let list = baseline();

        assert!(guard.should_block("https://www.instagram.com/p/123", &list));
        assert!(guard.should_block("http://m.facebook.com", &list));
        assert!(guard.should_block("WWW.REDDIT.COM/r/rust", &list));
        assert!(!guard.should_block("https://docs.rs", &list));
        assert!(!guard.should_block("https://xkcd.com", &list));
    }

    #[test]
    fn test_should_block_normalizes_entries() {
        let guard = guard();
        let list = vec!["https://www.Example.com/path".to_string()];
        assert!(guard.should_block("https://sub.example.com", &list));
    }

    #[test]
    fn test_video_host_is_never_blocked() {
        let guard = guard();
        let list = vec!["youtube.com".to_string(), "youtu.be".to_string()];

        assert!(!guard.should_block("https://www.youtube.com/watch?v=abc", &list));
        assert!(!guard.should_block("https://m.youtube.com/", &list));
        assert!(!guard.should_block("https://youtu.be/abc", &list));
    }

    #[test]
    fn test_empty_block_list_allows_everything() {
        let guard = guard();
        assert!(!guard.should_block("https://instagram.com", &[]));
    }

    #[test]
    fn test_redirect_to_site_surface() {
        let guard = guard();
        let event = NavigationEvent::new("www.instagram.com/foo", NavigationKind::Committed);

        assert_eq!(
            guard.evaluate(&event, &baseline()),
            NavigationDecision::Redirect {
                domain: "instagram.com".to_string(),
                to: "hoot://block/site?site=instagram.com".to_string(),
            }
        );
    }

    #[test]
    fn test_history_updates_are_evaluated_too() {
        let guard = guard();
        let event = NavigationEvent::new(
            "https://twitter.com/home",
            NavigationKind::HistoryStateUpdated,
        );
        assert!(matches!(
            guard.evaluate(&event, &baseline()),
            NavigationDecision::Redirect { .. }
        ));
    }

    #[test]
    fn test_video_host_delegates() {
        let guard = guard();
        let list = baseline();

        let watch = NavigationEvent::new("https://youtube.com/watch?v=abc", NavigationKind::Committed);
        assert_eq!(
            guard.evaluate(&watch, &list),
            NavigationDecision::Delegate {
                video_id: Some("abc".to_string())
            }
        );

        let home = NavigationEvent::new("https://www.youtube.com/", NavigationKind::Committed);
        assert_eq!(
            guard.evaluate(&home, &list),
            NavigationDecision::Delegate { video_id: None }
        );
    }

    #[test]
    fn test_video_id_forms() {
        let guard = guard();
        assert_eq!(
            guard.video_id("https://www.youtube.com/watch?list=x&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(guard.video_id("https://youtu.be/xyz?t=10"), Some("xyz".to_string()));
        assert_eq!(
            guard.video_id("https://youtube.com/shorts/short1"),
            Some("short1".to_string())
        );
        assert_eq!(guard.video_id("https://youtube.com/watch?v="), None);
        assert_eq!(guard.video_id("https://vimeo.com/watch?v=abc"), None);
    }

    #[test]
    fn test_unparseable_url_is_allowed() {
        let guard = guard();
        let event = NavigationEvent::new("", NavigationKind::Committed);
        assert_eq!(guard.evaluate(&event, &baseline()), NavigationDecision::Allow);
    }

    #[test]
    fn test_compose_block_list_dedups_in_order() {
        let list = compose_block_list(["reddit.com", "www.Reddit.com", "", "9gag.com", "x.com"]);
        assert_eq!(list, vec!["reddit.com", "9gag.com", "x.com"]);
    }

    #[test]
    fn test_custom_video_host() {
        let guard = NavigationGuard::new("vimeo.com", "hoot://block").unwrap();
        let list = vec!["vimeo.com".to_string(), "youtube.com".to_string()];

        assert!(!guard.should_block("https://vimeo.com/123", &list));
        assert!(guard.should_block("https://youtube.com/watch?v=abc", &list));
        assert!(NavigationGuard::new(" ", "hoot://block").is_err());
    }
}
