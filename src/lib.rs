// ABOUTME: Main library module for the collab-automator task engine
// ABOUTME: Exports all core modules and provides the public API

pub mod cli;
pub mod engine;
pub mod parser;
pub mod services;
pub mod tasks;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use engine::{Automator, Context, HandlerRegistry, Task, TaskError, TaskHandler, TaskStatus};
pub use parser::{DescriptorParser, DescriptorValidator};
pub use services::Services;

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
