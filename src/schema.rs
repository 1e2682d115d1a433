//! Attribute descriptors for managed resources.
//!
//! A schema says, per attribute, who owns the value (user, server or both), whether a change
//! forces replacement and whether the value must be masked in output.

use std::time::Duration;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Required,
    Optional,
    /// Set by the server only; never compared.
    Computed,
    /// User may set it; when omitted the server's value is accepted.
    OptionalComputed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub force_new: bool,
    pub sensitive: bool,
    /// Present for blocks; applies to every element when the value is a list.
    pub nested: Option<Block>,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            kind,
            force_new: false,
            sensitive: false,
            nested: None,
        }
    }

    pub fn required(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Required)
    }

    pub fn optional(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Optional)
    }

    pub fn computed(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Computed)
    }

    pub fn optional_computed(name: &'static str) -> Self {
        Self::new(name, AttributeKind::OptionalComputed)
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn block(mut self, nested: Block) -> Self {
        self.nested = Some(nested);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub attributes: Vec<Attribute>,
}

impl Block {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// True when any attribute at any depth is sensitive.
    pub fn contains_sensitive(&self) -> bool {
        self.attributes.iter().any(|a| {
            a.sensitive || a.nested.as_ref().is_some_and(Block::contains_sensitive)
        })
    }

    fn validate(&self, value: &Value, path: &str, errors: &mut Vec<String>) {
        let Some(object) = value.as_object() else {
            errors.push(format!("{}: expected an object", display_path(path)));
            return;
        };

        for key in object.keys() {
            if self.attribute(key).is_none() {
                errors.push(format!("{}: unsupported attribute", join(path, key)));
            }
        }

        for attribute in &self.attributes {
            let attribute_path = join(path, attribute.name);
            let value = object.get(attribute.name).unwrap_or(&Value::Null);

            if attribute.kind == AttributeKind::Required && is_empty(value) {
                errors.push(format!("{}: required attribute is missing", attribute_path));
                continue;
            }

            let Some(nested) = &attribute.nested else {
                continue;
            };
            match value {
                Value::Object(_) => nested.validate(value, &attribute_path, errors),
                Value::Array(items) => {
                    for (index, item) in items.iter().enumerate() {
                        nested.validate(item, &format!("{}.{}", attribute_path, index), errors);
                    }
                }
                _ => {}
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(30 * 60),
            read: Duration::from_secs(5 * 60),
            update: Duration::from_secs(30 * 60),
            delete: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub block: Block,
    pub timeouts: Timeouts,
}

impl ResourceSchema {
    /// Checks attribute names and required values; returns every problem found.
    pub fn validate(&self, config: &Value) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        self.block.validate(config, "", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// `null`, `""`, `[]` and `{}` all mean "not set".
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

pub(crate) fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}
