mod actions;
mod core;
mod jobs;
mod login;
mod progressive;
mod session;

pub use self::actions::{Action, ActionOutcome};
pub use self::core::JenkinsClient;
pub use self::jobs::DEFAULT_HISTORY_LIMIT;
pub use self::progressive::ProgressiveLog;
pub use self::session::SessionStore;
