//! Finding message rendering.

use crate::error::ComplianceResult;
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Variables available to message, remediation and auto-fix templates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateContext {
    pub resource_id: String,
    pub resource_name: String,
    pub resource_type: String,
    pub environment: String,
    pub rule_name: String,
    /// Comma-separated names for graph rules
    pub affected_resources: String,
}

/// Plain-text Handlebars renderer; no HTML escaping.
#[derive(Clone)]
pub struct TemplateRenderer {
    handlebars: Arc<Handlebars<'static>>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer").finish_non_exhaustive()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        Self {
            handlebars: Arc::new(handlebars),
        }
    }

    pub fn render(&self, template: &str, context: &TemplateContext) -> ComplianceResult<String> {
        Ok(self.handlebars.render_template(template, context)?)
    }

    /// Renders string leaves; other JSON values pass through.
    pub fn render_value(&self, value: &Value, context: &TemplateContext) -> ComplianceResult<Value> {
        Ok(match value {
            Value::String(template) => Value::String(self.render(template, context)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.render_value(item, context))
                    .collect::<ComplianceResult<_>>()?,
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| Ok((key.clone(), self.render_value(item, context)?)))
                    .collect::<ComplianceResult<_>>()?,
            ),
            other => other.clone(),
        })
    }
}
