use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use checkin_db::{CheckInResult, Database};
use checkin_gateway::dispatcher::Dispatcher;
use checkin_types::api::{AddGuestRequest, BucketPage, GuestFilter, Listing, ListingQuery, total_pages};
use checkin_types::events::ChangeKind;
use checkin_types::models::{Bucket, Guest};

use crate::error::DirectoryError;
use crate::scan::{QrDecoder, RgbaFrame};
use crate::search;

/// Result of a check-in attempt on an existing guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    CheckedIn(Guest),
    /// Nothing changed; the guest keeps the original timestamp.
    AlreadyCheckedIn(Guest),
}

impl CheckInOutcome {
    pub fn guest(&self) -> &Guest {
        match self {
            Self::CheckedIn(g) | Self::AlreadyCheckedIn(g) => g,
        }
    }

    pub fn message(&self) -> String {
        let guest = self.guest();
        let who = describe(guest);
        match self {
            Self::CheckedIn(_) => format!("{} checked in successfully.", who),
            Self::AlreadyCheckedIn(_) => match guest.checked_in_at {
                Some(at) => format!(
                    "{} already checked in at {}.",
                    who,
                    at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => format!("{} already checked in.", who),
            },
        }
    }
}

/// "Maria (Family)" or just "Maria" when uncategorized.
fn describe(guest: &Guest) -> String {
    match guest.category {
        Some(category) => format!("{} ({})", guest.name, category),
        None => guest.name.clone(),
    }
}

/// Guest Directory Service: every read and write of the guest list, with a
/// refresh broadcast after each successful mutation.
#[derive(Clone)]
pub struct GuestDirectory {
    db: Arc<Database>,
    dispatcher: Dispatcher,
    decoder: Arc<dyn QrDecoder>,
}

impl GuestDirectory {
    pub fn new(db: Arc<Database>, dispatcher: Dispatcher, decoder: Arc<dyn QrDecoder>) -> Self {
        Self {
            db,
            dispatcher,
            decoder,
        }
    }

    /// Run blocking DB work off the async runtime.
    async fn blocking<F, T>(&self, action: &'static str, f: F) -> Result<T, DirectoryError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(db.as_ref()))
            .await
            .map_err(|e| DirectoryError::store(action, anyhow::anyhow!("spawn_blocking join error: {}", e)))?
            .map_err(|e| DirectoryError::store(action, e))
    }

    // -- Reads --

    /// Pending and checked-in pages, queried independently under the same filters.
    pub async fn listing(&self, query: ListingQuery) -> Result<Listing, DirectoryError> {
        let filter = GuestFilter::from(&query);
        let pending_page = query.pending_page.max(1);
        let checked_in_page = query.checked_in_page.max(1);

        self.blocking("load the guest list", move |db| {
            Ok(Listing {
                pending: bucket_page(db, Bucket::Pending, &filter, pending_page)?,
                checked_in: bucket_page(db, Bucket::CheckedIn, &filter, checked_in_page)?,
            })
        })
        .await
    }

    pub async fn all_guests(&self) -> Result<Vec<Guest>, DirectoryError> {
        self.blocking("load the guest list", |db| db.list_all()).await
    }

    /// Full directory filtered locally, for the manual check-in dialog.
    pub async fn search(&self, term: &str) -> Result<Vec<Guest>, DirectoryError> {
        let all = self.all_guests().await?;
        Ok(search::filter_guests(all, term))
    }

    pub async fn guest(&self, id: &str) -> Result<Guest, DirectoryError> {
        let id = id.to_string();
        self.blocking("load the guest", move |db| db.get_guest(&id))
            .await?
            .ok_or(DirectoryError::GuestNotFound)
    }

    // -- Check-in --

    pub async fn check_in(&self, id: &str) -> Result<CheckInOutcome, DirectoryError> {
        let guest_id = id.to_string();
        let now = Utc::now();
        let result = self
            .blocking("register the check-in", move |db| db.check_in(&guest_id, now))
            .await?;

        match result {
            CheckInResult::CheckedIn(guest) => {
                info!("Guest {} ({}) checked in", guest.name, guest.id);
                self.dispatcher
                    .guests_changed(ChangeKind::CheckedIn, &guest.id, Some(&guest));
                Ok(CheckInOutcome::CheckedIn(guest))
            }
            CheckInResult::AlreadyCheckedIn(guest) => {
                info!("Guest {} ({}) tried to check in twice", guest.name, guest.id);
                Ok(CheckInOutcome::AlreadyCheckedIn(guest))
            }
            CheckInResult::NotFound => {
                warn!("Check-in for unknown guest id '{}'", id);
                Err(DirectoryError::GuestNotFound)
            }
        }
    }

    /// Decode a camera frame and check in the guest whose id it carries.
    pub async fn scan_check_in(&self, frame: RgbaFrame) -> Result<CheckInOutcome, DirectoryError> {
        let decoder = self.decoder.clone();
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(&frame))
            .await
            .map_err(|e| {
                DirectoryError::store("read the QR code", anyhow::anyhow!("spawn_blocking join error: {}", e))
            })?;

        let id = match decoded.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(DirectoryError::QrNotDetected),
        };

        info!("QR code scanned: {}", id);
        self.check_in(&id).await
    }

    // -- Mutations --

    pub async fn add_guest(&self, req: AddGuestRequest) -> Result<Guest, DirectoryError> {
        let guest = Guest {
            id: Uuid::new_v4().to_string(),
            name: req.name,
            email: req.email,
            phone: req.phone,
            confirmation: req.confirmation,
            message: req.message,
            confirmed_at: None,
            checked_in_at: req.as_checked_in.then(Utc::now),
            category: req.category,
        };

        let stored = self
            .blocking("add the guest", move |db| {
                db.insert_guest(&guest)?;
                db.get_guest(&guest.id)?
                    .ok_or_else(|| anyhow::anyhow!("Guest {} missing after insert", guest.id))
            })
            .await?;

        info!("Added guest {} ({}) as {:?}", stored.name, stored.id, stored.bucket());
        self.dispatcher
            .guests_changed(ChangeKind::Added, &stored.id, Some(&stored));
        Ok(stored)
    }

    /// Overwrite every field of the guest, check-in time included.
    pub async fn update_guest(&self, guest: Guest) -> Result<Guest, DirectoryError> {
        let (previous, stored) = self
            .blocking("update the guest", move |db| {
                let previous = db.upsert_guest(&guest)?;
                let stored = db
                    .get_guest(&guest.id)?
                    .ok_or_else(|| anyhow::anyhow!("Guest {} missing after upsert", guest.id))?;
                Ok((previous, stored))
            })
            .await?;

        if let Some(previous) = &previous {
            if previous.is_checked_in() && !stored.is_checked_in() {
                warn!("Update of guest {} ({}) cleared their check-in", stored.name, stored.id);
            }
        }

        self.dispatcher
            .guests_changed(ChangeKind::Updated, &stored.id, Some(&stored));
        Ok(stored)
    }

    /// Unconditional delete. Returns the removed guest's name, if the row existed.
    pub async fn delete_guest(&self, id: &str) -> Result<Option<String>, DirectoryError> {
        let guest_id = id.to_string();
        let removed = self
            .blocking("remove the guest", move |db| db.delete_guest(&guest_id))
            .await?;

        match &removed {
            Some(name) => info!("Removed guest {} ({})", name, id),
            None => info!("Delete of unknown guest id '{}'", id),
        }

        self.dispatcher.guests_changed(ChangeKind::Deleted, id, None);
        Ok(removed)
    }
}

fn bucket_page(db: &Database, bucket: Bucket, filter: &GuestFilter, page: u32) -> anyhow::Result<BucketPage> {
    let (guests, total) = db.list_bucket(bucket, filter, page)?;
    let category_counts = db.category_counts(bucket, filter)?;

    Ok(BucketPage {
        page,
        guests,
        total,
        total_pages: total_pages(total),
        category_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkin_types::events::DirectoryEvent;
    use checkin_types::models::GuestCategory;

    struct FixedDecoder(Option<&'static str>);

    impl QrDecoder for FixedDecoder {
        fn decode(&self, _frame: &RgbaFrame) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn directory_with(decoder: FixedDecoder) -> (GuestDirectory, Dispatcher) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let dispatcher = Dispatcher::new();
        let directory = GuestDirectory::new(db, dispatcher.clone(), Arc::new(decoder));
        (directory, dispatcher)
    }

    fn directory() -> GuestDirectory {
        directory_with(FixedDecoder(None)).0
    }

    fn request(name: &str, as_checked_in: bool) -> AddGuestRequest {
        AddGuestRequest {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: String::new(),
            confirmation: "yes".into(),
            message: None,
            category: None,
            as_checked_in,
        }
    }

    fn frame() -> RgbaFrame {
        RgbaFrame::new(1, 1, vec![0, 0, 0, 255]).unwrap()
    }

    #[tokio::test]
    async fn maria_checks_in_once() {
        let dir = directory();
        let maria = dir.add_guest(request("Maria", false)).await.unwrap();
        assert_eq!(maria.checked_in_at, None);

        let first = dir.check_in(&maria.id).await.unwrap();
        let CheckInOutcome::CheckedIn(checked) = &first else {
            panic!("expected CheckedIn, got {:?}", first);
        };
        assert_eq!(first.message(), "Maria checked in successfully.");

        let listing = dir.listing(ListingQuery::default()).await.unwrap();
        assert_eq!(listing.pending.total, 0);
        assert_eq!(listing.checked_in.guests[0].id, maria.id);

        let second = dir.check_in(&maria.id).await.unwrap();
        let CheckInOutcome::AlreadyCheckedIn(again) = &second else {
            panic!("expected AlreadyCheckedIn, got {:?}", second);
        };
        assert_eq!(again.checked_in_at, checked.checked_in_at);
        assert!(second.message().starts_with("Maria already checked in at "));
    }

    #[tokio::test]
    async fn already_checked_in_message_names_category() {
        let dir = directory();
        let mut req = request("Rita", true);
        req.category = Some(GuestCategory::Family);
        let rita = dir.add_guest(req).await.unwrap();

        let outcome = dir.check_in(&rita.id).await.unwrap();
        assert!(outcome.message().starts_with("Rita (Family) already checked in at "));
    }

    #[tokio::test]
    async fn concurrent_check_ins_succeed_once() {
        let dir = directory();
        let guest = dir.add_guest(request("Paulo", false)).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dir = dir.clone();
                let id = guest.id.clone();
                tokio::spawn(async move { dir.check_in(&id).await.unwrap() })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), CheckInOutcome::CheckedIn(_)) {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn unknown_guest_is_not_found() {
        let dir = directory();
        assert!(matches!(dir.check_in("missing").await, Err(DirectoryError::GuestNotFound)));
        assert!(matches!(dir.guest("missing").await, Err(DirectoryError::GuestNotFound)));
    }

    #[tokio::test]
    async fn added_pending_guest_shows_on_first_page() {
        let dir = directory();
        for i in 0..12 {
            dir.add_guest(request(&format!("Zed {:02}", i), false)).await.unwrap();
        }
        let ana = dir.add_guest(request("Ana", false)).await.unwrap();

        let listing = dir.listing(ListingQuery::default()).await.unwrap();
        assert_eq!(listing.pending.total, 13);
        assert_eq!(listing.pending.total_pages, 2);
        assert_eq!(listing.pending.guests.len(), 10);
        assert_eq!(listing.pending.guests[0].id, ana.id);

        let second = dir
            .listing(ListingQuery {
                pending_page: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(second.pending.guests.len(), 3);
        assert_eq!(second.checked_in.page, 1);
        assert_eq!(second.checked_in.total_pages, 0);
    }

    #[tokio::test]
    async fn search_spans_both_buckets() {
        let dir = directory();
        dir.add_guest(request("Mariana", false)).await.unwrap();
        dir.add_guest(request("Omar", true)).await.unwrap();
        dir.add_guest(request("Lucas", false)).await.unwrap();

        let names: Vec<_> = dir.search("MAR").await.unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Mariana", "Omar"]);

        let listing = dir
            .listing(ListingQuery {
                search: Some("mar".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listing.pending.total, 1);
        assert_eq!(listing.checked_in.total, 1);

        assert!(dir.search("xyz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_overwrites_check_in() {
        let dir = directory();
        let guest = dir.add_guest(request("Bia", true)).await.unwrap();

        let mut edited = guest.clone();
        edited.phone = "555".into();
        edited.checked_in_at = None;
        let stored = dir.update_guest(edited).await.unwrap();

        assert_eq!(stored.phone, "555");
        assert_eq!(stored.bucket(), Bucket::Pending);
    }

    #[tokio::test]
    async fn delete_removes_from_every_view() {
        let dir = directory();
        let guest = dir.add_guest(request("Caio", true)).await.unwrap();

        assert_eq!(dir.delete_guest(&guest.id).await.unwrap().as_deref(), Some("Caio"));
        assert_eq!(dir.delete_guest(&guest.id).await.unwrap(), None);

        let listing = dir.listing(ListingQuery::default()).await.unwrap();
        assert_eq!(listing.pending.total + listing.checked_in.total, 0);
        assert!(dir.all_guests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mutations_broadcast_refresh() {
        let (dir, dispatcher) = directory_with(FixedDecoder(None));
        let mut rx = dispatcher.subscribe();

        let guest = dir.add_guest(request("Dora", false)).await.unwrap();
        dir.check_in(&guest.id).await.unwrap();
        dir.delete_guest(&guest.id).await.unwrap();

        let mut kinds = Vec::new();
        for _ in 0..3 {
            if let DirectoryEvent::GuestsChanged { kind, guest_id, .. } = rx.recv().await.unwrap() {
                assert_eq!(guest_id, guest.id);
                kinds.push(kind);
            }
        }
        assert_eq!(kinds, vec![ChangeKind::Added, ChangeKind::CheckedIn, ChangeKind::Deleted]);
    }

    #[tokio::test]
    async fn scan_checks_in_decoded_id() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let seeded = Guest {
            id: "qr-123".into(),
            name: "Eva".into(),
            email: String::new(),
            phone: String::new(),
            confirmation: String::new(),
            message: None,
            confirmed_at: None,
            checked_in_at: None,
            category: None,
        };
        db.insert_guest(&seeded).unwrap();
        let dir = GuestDirectory::new(db, Dispatcher::new(), Arc::new(FixedDecoder(Some(" qr-123\n"))));

        let outcome = dir.scan_check_in(frame()).await.unwrap();
        assert!(matches!(outcome, CheckInOutcome::CheckedIn(ref g) if g.id == "qr-123"));
    }

    #[tokio::test]
    async fn scan_without_code_checks_nobody_in() {
        let (dir, dispatcher) = directory_with(FixedDecoder(None));
        dir.add_guest(request("Fabio", false)).await.unwrap();
        let mut rx = dispatcher.subscribe();

        assert!(matches!(dir.scan_check_in(frame()).await, Err(DirectoryError::QrNotDetected)));
        assert!(rx.try_recv().is_err());

        let listing = dir.listing(ListingQuery::default()).await.unwrap();
        assert_eq!(listing.checked_in.total, 0);
    }
}
