//! The page a blocked tab is sent to, and what it shows.

use chrono::Duration;
use hoot_ai::VideoMetadata;
use hoot_storage::LastBlock;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FocusError;

/// Command that always ends the session, shown on every block page
pub const ESCAPE_HATCH: &str = "hoot end";

/// Builds block surface URLs under a base such as `hoot://block`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSurface {
    base: String,
}

impl BlockSurface {
    /// # Errors
    ///
    /// Returns `InvalidInput` if `base` is not an absolute URL
    pub fn new(base: &str) -> Result<Self, FocusError> {
        let base = base.trim().trim_end_matches('/');
        Url::parse(base)
            .map_err(|e| FocusError::InvalidInput(format!("block page '{base}': {e}")))?;
        Ok(Self {
            base: base.to_string(),
        })
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// `<base>/site?site=<domain>`
    #[must_use]
    pub fn site_url(&self, domain: &str) -> String {
        self.page("site", &[("site", domain)])
    }

    /// `<base>/video?videoId=..&title=..&channel=..&reason=..`
    #[must_use]
    pub fn video_url(&self, video: &VideoMetadata, reason: &str) -> String {
        self.page(
            "video",
            &[
                ("videoId", video.content_id.as_str()),
                ("title", video.title.as_str()),
                ("channel", video.channel.as_deref().unwrap_or("Unknown")),
                ("reason", reason),
            ],
        )
    }

    fn page(&self, page: &str, params: &[(&str, &str)]) -> String {
        let raw = format!("{}/{page}", self.base);
        match Url::parse_with_params(&raw, params) {
            Ok(url) => url.to_string(),
            Err(e) => {
                log::warn!("Failed to build block surface URL {raw}: {e}");
                raw
            }
        }
    }
}

/// Everything the block surface renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPage {
    pub last_block: Option<LastBlock>,
    pub goal: Option<String>,
    pub remaining_seconds: i64,
    pub roast: String,
    pub escape_hatch: String,
}

impl BlockPage {
    #[must_use]
    pub fn remaining_display(&self) -> String {
        format_remaining(Duration::seconds(self.remaining_seconds))
    }
}

/// `HH:MM:SS`, clamped at zero
#[must_use]
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> VideoMetadata {
        VideoMetadata {
            content_id: "abc".to_string(),
            title: "Cats & dogs: a saga".to_string(),
            channel: None,
            description: None,
            url: None,
        }
    }

    #[test]
    fn test_site_url() {
        let surface = BlockSurface::new("hoot://block/").unwrap();
        assert_eq!(
            surface.site_url("instagram.com"),
            "hoot://block/site?site=instagram.com"
        );
    }

    #[test]
    fn test_video_url_encodes_params() {
        let surface = BlockSurface::new("https://hoot.local/blocked").unwrap();
        let url = Url::parse(&surface.video_url(&video(), "off-topic")).unwrap();

        assert_eq!(url.path(), "/blocked/video");
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            params,
            vec![
                ("videoId".to_string(), "abc".to_string()),
                ("title".to_string(), "Cats & dogs: a saga".to_string()),
                ("channel".to_string(), "Unknown".to_string()),
                ("reason".to_string(), "off-topic".to_string()),
            ]
        );
    }

    #[test]
    fn test_relative_base_is_rejected() {
        assert!(BlockSurface::new("block.html").is_err());
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::seconds(1500)), "00:25:00");
        assert_eq!(format_remaining(Duration::seconds(3661)), "01:01:01");
        assert_eq!(format_remaining(Duration::seconds(-5)), "00:00:00");
    }
}
