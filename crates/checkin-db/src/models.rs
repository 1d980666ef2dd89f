//! Database row types. These map directly to SQLite rows.
//! Timestamps and categories stay as stored text until `into_guest`.
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::Row;
use tracing::warn;

use checkin_types::models::{Guest, GuestCategory};

pub const GUEST_COLUMNS: &str =
    "id, name, email, phone, confirmation, message, confirmed_at, checked_in_at, category";

pub struct GuestRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub confirmation: String,
    pub message: Option<String>,
    pub confirmed_at: Option<String>,
    pub checked_in_at: Option<String>,
    pub category: Option<String>,
}

impl GuestRow {
    /// Expects the columns in `GUEST_COLUMNS` order.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            confirmation: row.get(4)?,
            message: row.get(5)?,
            confirmed_at: row.get(6)?,
            checked_in_at: row.get(7)?,
            category: row.get(8)?,
        })
    }

    pub fn from_guest(guest: &Guest) -> Self {
        Self {
            id: guest.id.clone(),
            name: guest.name.clone(),
            email: guest.email.clone(),
            phone: guest.phone.clone(),
            confirmation: guest.confirmation.clone(),
            message: guest.message.clone(),
            confirmed_at: guest.confirmed_at.map(format_timestamp),
            checked_in_at: guest.checked_in_at.map(format_timestamp),
            category: guest.category.map(|c| c.label().to_string()),
        }
    }

    pub fn into_guest(self) -> Guest {
        let confirmed_at = parse_column(&self.id, "confirmed_at", self.confirmed_at.as_deref());
        let checked_in_at = parse_column(&self.id, "checked_in_at", self.checked_in_at.as_deref());

        let category = self.category.as_deref().and_then(|label| {
            let parsed = GuestCategory::from_label(label);
            if parsed.is_none() {
                warn!("Unknown category '{}' on guest '{}'", label, self.id);
            }
            parsed
        });

        Guest {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            confirmation: self.confirmation,
            message: self.message,
            confirmed_at,
            checked_in_at,
            category,
        }
    }
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone; read it as UTC
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .ok()
}

fn parse_column(id: &str, column: &str, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        warn!("Corrupt {} '{}' on guest '{}'", column, raw, id);
    }
    parsed
}
