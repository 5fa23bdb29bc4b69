// ABOUTME: Static validation of descriptor trees before anything runs
// ABOUTME: Checks structure, continuations and each handler's required parameters

use serde_json::Value;
use std::sync::Arc;

use super::error::ValidationError;
use crate::engine::task::continuations;
use crate::engine::{HandlerRegistry, AFTER_KEY};

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
    /// Paths of every key that will be dispatched.
    pub recognized: Vec<String>,
    pub is_valid: bool,
}

pub struct DescriptorValidator {
    registry: Arc<HandlerRegistry>,
}

impl DescriptorValidator {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    pub fn validate(&self, descriptor: &Value) -> ValidationReport {
        let mut report = ValidationReport::default();
        self.validate_node("$", descriptor, &mut report);

        if report.recognized.is_empty() && report.errors.is_empty() {
            report
                .warnings
                .push("Descriptor contains no recognized task; running it does nothing".to_string());
        }

        report.is_valid = report.errors.is_empty();
        report
    }

    fn validate_node(&self, path: &str, descriptor: &Value, report: &mut ValidationReport) {
        let Some(entries) = descriptor.as_object() else {
            report.errors.push(ValidationError::NotAnObject {
                path: path.to_string(),
            });
            return;
        };

        for (key, value) in entries {
            let key_path = format!("{}.{}", path, key);

            if key == AFTER_KEY {
                self.validate_continuations(&key_path, value, report);
            } else if self.registry.contains(key) {
                report.recognized.push(key_path.clone());

                if let Err(e) = self.registry.validate_descriptor(key, value) {
                    report.errors.push(ValidationError::InvalidTaskDescriptor {
                        path: key_path.clone(),
                        task_type: key.clone(),
                        reason: e.message,
                    });
                }
                if let Some(after) = value.get(AFTER_KEY) {
                    self.validate_continuations(&format!("{}.{}", key_path, AFTER_KEY), after, report);
                }
            } else {
                report
                    .warnings
                    .push(format!("Unrecognized key '{}' will be ignored", key_path));
            }
        }
    }

    fn validate_continuations(&self, path: &str, after: &Value, report: &mut ValidationReport) {
        match continuations(after) {
            Ok(descriptors) => {
                for (index, descriptor) in descriptors.iter().enumerate() {
                    self.validate_node(&format!("{}[{}]", path, index), descriptor, report);
                }
            }
            Err(_) => report.errors.push(ValidationError::InvalidContinuation {
                path: path.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Automator;
    use crate::services::{RestConfig, RestServices, Services};
    use serde_json::json;
    use std::time::Duration;

    fn registry() -> Arc<HandlerRegistry> {
        let registry = HandlerRegistry::new();
        registry.register_sync("collab", |_, _| Ok(Value::Null));
        registry.register_sync("nav", |_, _| Ok(Value::Null));
        Arc::new(registry)
    }

    #[test]
    fn test_valid_tree() {
        let validator = DescriptorValidator::new(registry());
        let report = validator.validate(&json!({
            "collab": { "title": "t", "after": { "nav": { "app": "Wiki", "name": "Home" } } },
            "after": [{ "nav": { "app": "Files", "name": "Storage" } }]
        }));

        assert!(report.is_valid);
        assert_eq!(
            report.recognized,
            vec!["$.collab", "$.collab.after[0].nav", "$.after[0].nav"]
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_reports_structural_errors() {
        let validator = DescriptorValidator::new(registry());
        let report = validator.validate(&json!({ "after": "nav", "extra": 1 }));

        assert!(!report.is_valid);
        assert_eq!(
            report.errors,
            vec![ValidationError::InvalidContinuation {
                path: "$.after".to_string()
            }]
        );
        assert!(report.warnings[0].contains("$.extra"));
    }

    #[test]
    fn test_uses_handler_validation() {
        let services = Services::from_rest(Arc::new(
            RestServices::new(RestConfig {
                collab_api_url: "http://localhost/".parse().unwrap(),
                document_api_url: "http://localhost/".parse().unwrap(),
                token: None,
                timeout: Duration::from_secs(1),
            })
            .unwrap(),
        ));
        let automator = Automator::with_services(services);
        let validator = DescriptorValidator::new(automator.registry().clone());

        let report = validator.validate(&json!({
            "collab": { "title": "t", "nav": [{ "app": "Wiki", "name": "Home" }] },
            "after": { "nav": { "app": "Wiki" } }
        }));

        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            ValidationError::InvalidTaskDescriptor { task_type, path, .. }
                if task_type == "nav" && path == "$.after[0].nav"
        ));
    }

    #[test]
    fn test_empty_descriptor_warns() {
        let report = DescriptorValidator::new(registry()).validate(&json!({}));
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
    }
}
