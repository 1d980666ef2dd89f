use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use checkin_types::api::{
    AddGuestRequest, CheckInResponse, CheckInStatus, GuestResponse, ListingQuery, MessageResponse,
    SearchQuery,
};
use checkin_types::models::{Bucket, CategoryStyle, Guest};

use crate::directory::CheckInOutcome;
use crate::error::DirectoryError;
use crate::state::AppState;

/// 200 for a fresh check-in, 409 when the guest had already arrived.
pub fn check_in_response(outcome: CheckInOutcome) -> (StatusCode, Json<CheckInResponse>) {
    let message = outcome.message();
    let (status, code, guest) = match outcome {
        CheckInOutcome::CheckedIn(g) => (CheckInStatus::CheckedIn, StatusCode::OK, g),
        CheckInOutcome::AlreadyCheckedIn(g) => (CheckInStatus::AlreadyCheckedIn, StatusCode::CONFLICT, g),
    };

    (
        code,
        Json(CheckInResponse {
            status,
            guest,
            message,
        }),
    )
}

/// GET /guests/listing
pub async fn listing(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, DirectoryError> {
    Ok(Json(state.directory.listing(query).await?))
}

/// GET /guests
pub async fn list_all(State(state): State<AppState>) -> Result<impl IntoResponse, DirectoryError> {
    Ok(Json(state.directory.all_guests().await?))
}

/// GET /guests/search?q=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, DirectoryError> {
    Ok(Json(state.directory.search(&query.q).await?))
}

pub async fn get_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, DirectoryError> {
    Ok(Json(state.directory.guest(&id).await?))
}

pub async fn add_guest(
    State(state): State<AppState>,
    Json(req): Json<AddGuestRequest>,
) -> Result<impl IntoResponse, DirectoryError> {
    let guest = state.directory.add_guest(req).await?;
    let list = match guest.bucket() {
        Bucket::Pending => "pending",
        Bucket::CheckedIn => "checked-in",
    };
    let message = format!("{} was added to the {} list.", guest.name, list);

    Ok((StatusCode::CREATED, Json(GuestResponse { guest, message })))
}

/// PUT /guests/{id}, full record. An empty body id takes the path id.
pub async fn update_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut guest): Json<Guest>,
) -> Result<impl IntoResponse, DirectoryError> {
    if guest.id.is_empty() {
        guest.id = id;
    } else if guest.id != id {
        return Err(DirectoryError::IdMismatch);
    }

    let guest = state.directory.update_guest(guest).await?;
    let message = format!("{}'s details were updated.", guest.name);

    Ok(Json(GuestResponse { guest, message }))
}

pub async fn delete_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, DirectoryError> {
    let message = match state.directory.delete_guest(&id).await? {
        Some(name) => format!("{} was removed from the guest list.", name),
        None => "The guest was removed from the guest list.".to_string(),
    };

    Ok(Json(MessageResponse { message }))
}

pub async fn check_in(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, DirectoryError> {
    let outcome = state.directory.check_in(&id).await?;
    Ok(check_in_response(outcome))
}

/// GET /categories
pub async fn categories() -> impl IntoResponse {
    Json(CategoryStyle::table())
}
