// Public API - what other modules can use
pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{SessionConfig, SessionManager, SessionManagerBuilder};
pub use models::Session;
pub use types::{SessionSnapshot, SessionState};

// Internal modules
pub mod clock;
mod manager;
pub mod models;
mod refresh;
mod store;
pub mod types;
