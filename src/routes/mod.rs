pub mod loader;
mod planner;

pub use planner::{PlanMode, Planner, DEFAULT_MAX_BATCH};
