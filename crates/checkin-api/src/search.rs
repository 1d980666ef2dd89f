//! Client-side filtering of the full directory for the manual check-in box.

use checkin_types::models::Guest;

/// Case-insensitive substring match on name, email or phone.
pub fn matches(guest: &Guest, term: &str) -> bool {
    let term = term.to_lowercase();
    [&guest.name, &guest.email, &guest.phone]
        .into_iter()
        .any(|field| field.to_lowercase().contains(&term))
}

/// Keep the guests matching `term`, preserving order. The term is trimmed
/// first; a blank term keeps all.
pub fn filter_guests(guests: Vec<Guest>, term: &str) -> Vec<Guest> {
    let term = term.trim();
    if term.is_empty() {
        return guests;
    }
    guests.into_iter().filter(|g| matches(g, term)).collect()
}
