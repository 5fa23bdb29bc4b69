// ABOUTME: Required-parameter checks for task descriptors
// ABOUTME: Fails fast with MissingParameter naming the first absent key

use serde_json::Value;

use super::error::{Result, TaskError};

/// Check that every key in `required` is present on `descriptor`.
///
/// A key set to `null` counts as present; only absent keys fail. A descriptor
/// that is not an object is missing every key.
pub fn ensure_parameters(descriptor: &Value, required: &[&str]) -> Result<()> {
    for key in required {
        let present = descriptor
            .as_object()
            .map(|object| object.contains_key(*key))
            .unwrap_or(false);

        if !present {
            return Err(TaskError::missing_parameter(key));
        }
    }

    Ok(())
}

/// Like [`ensure_parameters`] but satisfied when any one of the keys is present.
pub fn ensure_any_parameter(descriptor: &Value, candidates: &[&str]) -> Result<()> {
    let found = candidates.iter().any(|key| {
        descriptor
            .as_object()
            .map(|object| object.contains_key(*key))
            .unwrap_or(false)
    });

    if found {
        Ok(())
    } else {
        Err(TaskError::missing_parameter(&candidates.join("|")))
    }
}
