pub mod events;
pub mod guard;
pub mod presence;
pub mod sessions;

pub use guard::{auto_join, ensure_voice, live_call};
pub use presence::PresenceMonitor;
pub use sessions::VoiceSessions;
