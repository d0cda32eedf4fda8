pub mod gamification;
pub mod profile;
pub mod ranker;
pub mod scheduler;
pub mod streak;
