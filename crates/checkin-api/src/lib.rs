pub mod directory;
pub mod error;
pub mod guests;
pub mod scan;
pub mod search;
pub mod session;
pub mod state;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use checkin_gateway::connection;

use crate::state::AppState;

/// Every route of the check-in service, behind the advisory session check.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/guests", get(guests::list_all).post(guests::add_guest))
        .route("/guests/listing", get(guests::listing))
        .route("/guests/search", get(guests::search))
        .route(
            "/guests/{id}",
            get(guests::get_guest)
                .put(guests::update_guest)
                .delete(guests::delete_guest),
        )
        .route("/guests/{id}/check-in", post(guests::check_in))
        .route(
            "/scan",
            post(scan::scan).layer(DefaultBodyLimit::max(scan::MAX_FRAME_BYTES)),
        )
        .route("/categories", get(guests::categories))
        .route("/gateway", get(ws_upgrade))
        .layer(middleware::from_fn_with_state(state.clone(), session::observe_session))
        .with_state(state)
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher))
}
