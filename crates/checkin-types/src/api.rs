use serde::{Deserialize, Serialize};

use crate::models::{Guest, GuestCategory};

/// Rows per listing page. Not configurable by clients.
pub const PAGE_SIZE: u32 = 10;

/// `ceil(total / PAGE_SIZE)`; zero rows means zero pages.
pub fn total_pages(total: u64) -> u32 {
    total.div_ceil(PAGE_SIZE as u64) as u32
}

/// Row offset of a 1-based page. Page 0 is read as page 1.
pub fn page_offset(page: u32) -> u64 {
    page.saturating_sub(1) as u64 * PAGE_SIZE as u64
}

fn first_page() -> u32 {
    1
}

// -- Listing --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<GuestCategory>,
    #[serde(default = "first_page")]
    pub pending_page: u32,
    #[serde(default = "first_page")]
    pub checked_in_page: u32,
}

impl ListingQuery {
    /// Search term with surrounding whitespace removed; blank means no search.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Filters shared by both bucket queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestFilter {
    pub search: Option<String>,
    pub category: Option<GuestCategory>,
}

impl From<&ListingQuery> for GuestFilter {
    fn from(query: &ListingQuery) -> Self {
        Self {
            search: query.search_term().map(str::to_string),
            category: query.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Option<GuestCategory>,
    pub count: u64,
}

/// One page of one bucket plus its exact totals for the active filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketPage {
    pub page: u32,
    pub guests: Vec<Guest>,
    pub total: u64,
    pub total_pages: u32,
    pub category_counts: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub pending: BucketPage,
    pub checked_in: BucketPage,
}

// -- Mutations --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddGuestRequest {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub confirmation: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub category: Option<GuestCategory>,
    #[serde(default)]
    pub as_checked_in: bool,
}

/// A guest echoed back after a mutation, with the notification text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestResponse {
    pub guest: Guest,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    CheckedIn,
    AlreadyCheckedIn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInResponse {
    pub status: CheckInStatus,
    pub guest: Guest,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// -- Search / scan --

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ScanQuery {
    pub width: u32,
    pub height: u32,
}
