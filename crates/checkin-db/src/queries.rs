use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params_from_iter};

use checkin_types::api::{CategoryCount, GuestFilter, PAGE_SIZE, page_offset};
use checkin_types::models::{Bucket, Guest, GuestCategory};

use crate::Database;
use crate::functions::{LOWER_FN, NAME_COLLATION};
use crate::models::{GUEST_COLUMNS, GuestRow, format_timestamp};

/// Outcome of the conditional check-in update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInResult {
    CheckedIn(Guest),
    /// Row exists and already had a timestamp; nothing was written.
    AlreadyCheckedIn(Guest),
    NotFound,
}

impl Database {
    // -- Listing --

    /// One page of a bucket, ordered by name, plus the exact number of rows
    /// matching the filters.
    pub fn list_bucket(
        &self,
        bucket: Bucket,
        filter: &GuestFilter,
        page: u32,
    ) -> Result<(Vec<Guest>, u64)> {
        self.with_conn(|conn| {
            let (clause, params) = bucket_where(bucket, filter);

            let count_sql = format!("SELECT COUNT(*) FROM guests WHERE {}", clause);
            let total: i64 =
                conn.query_row(&count_sql, params_from_iter(params.iter()), |r| r.get(0))?;

            let sql = format!(
                "SELECT {} FROM guests WHERE {} ORDER BY name COLLATE {} ASC, id ASC LIMIT {} OFFSET {}",
                GUEST_COLUMNS,
                clause,
                NAME_COLLATION,
                PAGE_SIZE,
                page_offset(page)
            );
            let guests = query_guests(conn, &sql, &params)?;

            Ok((guests, total as u64))
        })
    }

    /// Rows per category across the whole bucket for the given filters.
    /// Unknown stored labels are counted with uncategorized guests.
    pub fn category_counts(&self, bucket: Bucket, filter: &GuestFilter) -> Result<Vec<CategoryCount>> {
        self.with_conn(|conn| {
            let (clause, params) = bucket_where(bucket, filter);
            let sql = format!(
                "SELECT category, COUNT(*) FROM guests WHERE {} GROUP BY category",
                clause
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| {
                    Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut counts: BTreeMap<Option<GuestCategory>, u64> = BTreeMap::new();
            for (label, count) in rows {
                let category = label.as_deref().and_then(GuestCategory::from_label);
                *counts.entry(category).or_default() += count as u64;
            }

            Ok(counts
                .into_iter()
                .map(|(category, count)| CategoryCount { category, count })
                .collect())
        })
    }

    /// Every guest ordered by name. No filters, no paging.
    pub fn list_all(&self) -> Result<Vec<Guest>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM guests ORDER BY name COLLATE {} ASC, id ASC",
                GUEST_COLUMNS, NAME_COLLATION
            );
            query_guests(conn, &sql, &[])
        })
    }

    pub fn get_guest(&self, id: &str) -> Result<Option<Guest>> {
        self.with_conn(|conn| query_guest(conn, id))
    }

    // -- Mutations --

    pub fn insert_guest(&self, guest: &Guest) -> Result<()> {
        let row = GuestRow::from_guest(guest);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO guests (id, name, email, phone, confirmation, message, confirmed_at, checked_in_at, category)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    row.id,
                    row.name,
                    row.email,
                    row.phone,
                    row.confirmation,
                    row.message,
                    row.confirmed_at,
                    row.checked_in_at,
                    row.category
                ],
            )?;
            Ok(())
        })
    }

    /// Insert or overwrite every column of the row keyed by `guest.id`.
    /// Returns the row as it was before, if there was one.
    pub fn upsert_guest(&self, guest: &Guest) -> Result<Option<Guest>> {
        let row = GuestRow::from_guest(guest);
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let previous = query_guest(&tx, &row.id)?;

            tx.execute(
                "INSERT INTO guests (id, name, email, phone, confirmation, message, confirmed_at, checked_in_at, category)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    email = excluded.email,
                    phone = excluded.phone,
                    confirmation = excluded.confirmation,
                    message = excluded.message,
                    confirmed_at = excluded.confirmed_at,
                    checked_in_at = excluded.checked_in_at,
                    category = excluded.category",
                rusqlite::params![
                    row.id,
                    row.name,
                    row.email,
                    row.phone,
                    row.confirmation,
                    row.message,
                    row.confirmed_at,
                    row.checked_in_at,
                    row.category
                ],
            )?;

            tx.commit()?;
            Ok(previous)
        })
    }

    /// Returns the removed guest's name. A missing id is not an error.
    pub fn delete_guest(&self, id: &str) -> Result<Option<String>> {
        self.with_conn_mut(|conn| {
            conn.query_row("DELETE FROM guests WHERE id = ?1 RETURNING name", [id], |r| r.get(0))
                .optional()
        })
    }

    /// Set the check-in time only if it is still null. The update and the
    /// read-back share the connection lock, so two concurrent calls for the
    /// same guest produce exactly one `CheckedIn`.
    pub fn check_in(&self, id: &str, at: DateTime<Utc>) -> Result<CheckInResult> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE guests SET checked_in_at = ?2 WHERE id = ?1 AND checked_in_at IS NULL",
                (id, format_timestamp(at)),
            )?;

            let result = match query_guest(conn, id)? {
                None => CheckInResult::NotFound,
                Some(guest) if changed == 0 => CheckInResult::AlreadyCheckedIn(guest),
                Some(guest) => CheckInResult::CheckedIn(guest),
            };
            Ok(result)
        })
    }
}

/// WHERE clause and positional parameters for one bucket under `filter`.
fn bucket_where(bucket: Bucket, filter: &GuestFilter) -> (String, Vec<String>) {
    let mut clauses = vec![
        match bucket {
            Bucket::Pending => "checked_in_at IS NULL",
            Bucket::CheckedIn => "checked_in_at IS NOT NULL",
        }
        .to_string(),
    ];
    let mut params = Vec::new();

    if let Some(term) = &filter.search {
        params.push(term.to_lowercase());
        let n = params.len();
        clauses.push(format!(
            "(instr({f}(name), ?{n}) > 0 OR instr({f}(email), ?{n}) > 0 OR instr({f}(phone), ?{n}) > 0)",
            f = LOWER_FN
        ));
    }

    if let Some(category) = filter.category {
        params.push(category.label().to_string());
        clauses.push(format!("category = ?{}", params.len()));
    }

    (clauses.join(" AND "), params)
}

fn query_guests(conn: &Connection, sql: &str, params: &[String]) -> Result<Vec<Guest>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), GuestRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(GuestRow::into_guest).collect())
}

fn query_guest(conn: &Connection, id: &str) -> Result<Option<Guest>> {
    let sql = format!("SELECT {} FROM guests WHERE id = ?1", GUEST_COLUMNS);
    let row = conn.query_row(&sql, [id], GuestRow::from_row).optional()?;

    Ok(row.map(GuestRow::into_guest))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
