// Session event plumbing
//
// Lets state that depends on the session (access flags, cached preview data)
// react to login, refresh and logout without being wired into the session
// manager itself.

// Public API - what other modules can use
pub use bus::EventBus;
pub use events::{LogoutReason, SessionEvent};
pub use handler::{EventError, SessionEventHandler};
pub use subscription::SessionSubscription;

// Internal modules
mod bus;
mod events;
mod handler;
mod subscription;
