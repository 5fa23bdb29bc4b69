// ABOUTME: Task automation engine module
// ABOUTME: Handler registry, parameter checks, task nodes and the descriptor tree runner

pub mod automator;
pub mod context;
pub mod error;
pub mod node;
pub mod registry;
pub mod result;
pub mod task;
pub mod validation;

pub use automator::Automator;
pub use context::Context;
pub use error::{ErrorType, Outcome, Result, TaskError};
pub use node::TaskNode;
pub use registry::{HandlerRegistry, TaskHandler};
pub use result::{RunReport, RunSummary, TaskRecord, TaskStatus};
pub use task::{Task, AFTER_KEY};
pub use validation::{ensure_any_parameter, ensure_parameters};
