mod backend;
mod service;

pub use backend::{ChatBackend, ChatConfig, HintBackend};
pub use service::{DEFAULT_HINT_TIMEOUT, HintService};
