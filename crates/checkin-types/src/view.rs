//! State of the check-in page, held by a front end.
//!
//! One dialog at most is open at a time (`ViewMode`); search, filter and the
//! two page cursors are orthogonal to it. Every user-visible outcome goes
//! through the single notification slot.

use crate::models::{Bucket, Guest, GuestCategory};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Idle,
    Adding,
    Editing(Guest),
    Deleting(Guest),
    Scanning,
    ManualCheckIn { query: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    mode: ViewMode,
    search: String,
    category: Option<GuestCategory>,
    pending_page: u32,
    checked_in_page: u32,
    notification: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            mode: ViewMode::Idle,
            search: String::new(),
            category: None,
            pending_page: 1,
            checked_in_page: 1,
            notification: None,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn category(&self) -> Option<GuestCategory> {
        self.category
    }

    pub fn page(&self, bucket: Bucket) -> u32 {
        match bucket {
            Bucket::Pending => self.pending_page,
            Bucket::CheckedIn => self.checked_in_page,
        }
    }

    pub fn notification(&self) -> Option<&str> {
        self.notification.as_deref()
    }

    // -- Dialogs --

    fn open(&mut self, mode: ViewMode) -> bool {
        if self.mode != ViewMode::Idle {
            return false;
        }
        self.mode = mode;
        true
    }

    pub fn open_add(&mut self) -> bool {
        self.open(ViewMode::Adding)
    }

    pub fn open_edit(&mut self, guest: Guest) -> bool {
        self.open(ViewMode::Editing(guest))
    }

    pub fn open_delete(&mut self, guest: Guest) -> bool {
        self.open(ViewMode::Deleting(guest))
    }

    pub fn start_scan(&mut self) -> bool {
        self.open(ViewMode::Scanning)
    }

    pub fn open_manual_check_in(&mut self) -> bool {
        self.open(ViewMode::ManualCheckIn {
            query: String::new(),
        })
    }

    /// Update the manual check-in search box. Ignored outside that dialog.
    pub fn set_manual_query(&mut self, value: &str) {
        if let ViewMode::ManualCheckIn { query } = &mut self.mode {
            *query = value.to_string();
        }
    }

    pub fn close(&mut self) {
        self.mode = ViewMode::Idle;
    }

    /// The camera could not start. The scanning dialog stays open.
    pub fn camera_failed(&mut self, message: impl Into<String>) {
        self.notify(message);
    }

    /// A frame was captured and decoded (or not). Scanning ends either way.
    pub fn scan_finished(&mut self) {
        if self.mode == ViewMode::Scanning {
            self.mode = ViewMode::Idle;
        }
    }

    // -- Filters and paging --

    pub fn set_search(&mut self, term: &str) {
        if self.search != term {
            self.search = term.to_string();
            self.reset_pages();
        }
    }

    /// Selecting the active category clears the filter.
    pub fn toggle_category(&mut self, category: GuestCategory) {
        self.category = if self.category == Some(category) {
            None
        } else {
            Some(category)
        };
        self.reset_pages();
    }

    pub fn set_page(&mut self, bucket: Bucket, page: u32, total_pages: u32) {
        let page = page.clamp(1, total_pages.max(1));
        match bucket {
            Bucket::Pending => self.pending_page = page,
            Bucket::CheckedIn => self.checked_in_page = page,
        }
    }

    pub fn next_page(&mut self, bucket: Bucket, total_pages: u32) {
        let next = self.page(bucket).saturating_add(1);
        self.set_page(bucket, next, total_pages);
    }

    pub fn prev_page(&mut self, bucket: Bucket, total_pages: u32) {
        let prev = self.page(bucket).saturating_sub(1);
        self.set_page(bucket, prev, total_pages);
    }

    fn reset_pages(&mut self) {
        self.pending_page = 1;
        self.checked_in_page = 1;
    }

    // -- Notifications --

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notification = Some(message.into());
    }

    pub fn dismiss(&mut self) {
        self.notification = None;
    }
}
