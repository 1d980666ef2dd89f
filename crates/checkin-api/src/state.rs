use std::sync::Arc;

use checkin_db::Database;
use checkin_gateway::dispatcher::Dispatcher;

use crate::directory::GuestDirectory;
use crate::scan::{QrDecoder, RqrrDecoder};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub directory: GuestDirectory,
    pub dispatcher: Dispatcher,
    pub session_secret: String,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, session_secret: String) -> AppState {
        Self::with_decoder(db, session_secret, Arc::new(RqrrDecoder))
    }

    pub fn with_decoder(
        db: Arc<Database>,
        session_secret: String,
        decoder: Arc<dyn QrDecoder>,
    ) -> AppState {
        let dispatcher = Dispatcher::new();
        Arc::new(Self {
            directory: GuestDirectory::new(db, dispatcher.clone(), decoder),
            dispatcher,
            session_secret,
        })
    }
}
