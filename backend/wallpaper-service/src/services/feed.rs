//! Feed parsing and entry selection
//!
//! Declares only the slice of the upstream listing schema that the selection
//! policy consumes; everything else in the document is ignored so upstream
//! schema drift stays contained in this module.

use crate::error::SelectError;
use serde::Deserialize;

/// One page of the upstream feed
#[derive(Debug, Deserialize)]
pub struct FeedPage {
    pub data: FeedListing,
}

#[derive(Debug, Deserialize)]
pub struct FeedListing {
    /// Pagination cursor, unused beyond existence
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub children: Vec<FeedEntry>,
}

/// One candidate post from the feed
#[derive(Debug, Deserialize)]
pub struct FeedEntry {
    /// Entry kind discriminator (e.g. "t3" for a post)
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub data: FeedEntryData,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedEntryData {
    /// Raw post URL, fallback when the resolved URL is absent
    #[serde(default)]
    pub url: String,
    /// Resolved outbound URL
    #[serde(default)]
    pub url_overridden_by_dest: String,
}

impl FeedEntry {
    /// URL this entry links to: the resolved URL when present, the raw URL
    /// otherwise
    fn link_url(&self) -> &str {
        if !self.data.url_overridden_by_dest.is_empty() {
            &self.data.url_overridden_by_dest
        } else {
            &self.data.url
        }
    }

    /// An entry is eligible when it links to a single image, not a
    /// multi-image container
    fn is_eligible(&self) -> bool {
        let url = self.link_url();
        !url.is_empty() && !url.contains("gallery")
    }
}

/// Index of the first entry considered; entry 0 is the pinned/sticky post
const FIRST_CANDIDATE: usize = 1;

/// Select the URL of the first eligible entry in the page.
///
/// Walks the entries in feed order starting past the pinned post. Container
/// entries are skipped entirely, never partially resolved. Exhausting the
/// page is `NoEligibleEntry`, not a fault.
pub fn select_eligible_entry(page: &FeedPage) -> Result<&str, SelectError> {
    page.data
        .children
        .iter()
        .skip(FIRST_CANDIDATE)
        .find(|entry| entry.is_eligible())
        .map(|entry| entry.link_url())
        .ok_or(SelectError::NoEligibleEntry)
}
