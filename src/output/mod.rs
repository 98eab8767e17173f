mod history;
mod progress;
mod prompt;
mod queue;
mod status;
mod styling;

pub use history::render_history;
pub use progress::FetchProgress;
pub use prompt::confirm;
pub use queue::render_queue;
pub use status::render_jobs;
pub use styling::{bright_green, bright_red};
