//! Adaptive Spanish-learning engine: SM-2 vocabulary scheduling, content
//! ranking, learner profiling and a gamification ledger behind one per-user
//! facade.

pub mod config;
pub mod engine;
pub mod logging;
pub mod services;
pub mod store;
pub mod types;

pub use config::EngineConfig;
pub use engine::{EngineError, LearningEngine};
pub use store::{JsonFileStore, MemoryStore, StateStore, StoreError, UserState};
pub use types::{CefrLevel, Category, LengthPreference, ReviewQuality};
