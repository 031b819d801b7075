pub mod cli;
pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod embeddings;
pub mod error;
pub mod matcher;
pub mod store;

pub use config::TriggerConfig;
pub use debounce::{DebounceEngine, TriggerEvent, TriggerRule};
pub use dispatch::{Action, ActionDispatcher, DispatchQueue, LogDispatcher};
pub use error::{ClipwatchError, Result};
pub use matcher::{MatchResult, Matcher};
pub use store::{Polarity, Prompt, PromptStore, StoreSnapshot};
