//! Application layer: session, list view and the shared state wiring them

pub mod list_view;
pub mod preferences;
pub mod session;
pub mod state;

pub use list_view::{FormMode, ListView, Submitted};
pub use preferences::Preferences;
pub use session::{Session, SessionError};
pub use state::AppState;
