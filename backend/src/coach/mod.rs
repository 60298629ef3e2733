pub mod prompt;
pub mod resolver;

pub use resolver::{normalize_reply, PlanResolver, PlanSource};
