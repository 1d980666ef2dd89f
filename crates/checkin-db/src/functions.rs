//! SQL helpers registered on every connection. SQLite's built-in `lower()`
//! and BINARY collation only understand ASCII, which mangles names like
//! "Ângela" or "Érica".

use std::cmp::Ordering;

use anyhow::Result;
use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// `unicode_lower(text)`: full Unicode lowercase. NULL stays NULL.
pub const LOWER_FN: &str = "unicode_lower";

/// `COLLATE guest_name`: accent- and case-insensitive ordering for names.
pub const NAME_COLLATION: &str = "guest_name";

pub fn register(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text = ctx.get::<Option<String>>(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;

    conn.create_collation(NAME_COLLATION, compare_names)?;
    Ok(())
}

/// Name with accents stripped and case folded, e.g. "Ângela" -> "angela".
fn sort_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Alphabetical as a person reads it; raw bytes break ties so distinct
/// names never compare equal.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b)).then_with(|| a.cmp(b))
}
