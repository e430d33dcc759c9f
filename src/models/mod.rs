pub mod session;

pub use session::{goal_progress, productivity_score, ActiveSession, SessionSummary};
