// ABOUTME: Parser module for task descriptor files
// ABOUTME: Exports descriptor loading, validation and error types

pub mod descriptor;
pub mod error;
pub mod validation;

pub use descriptor::DescriptorParser;
pub use error::{ParserError, ValidationError};
pub use validation::{DescriptorValidator, ValidationReport};
