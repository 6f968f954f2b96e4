//! `{{placeholder}}` templates used for entries, groups and releases.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Template parsing and rendering errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A `{{` was opened but never closed.
    #[error("Unterminated placeholder starting at byte {offset}")]
    Unterminated {
        /// Byte offset of the opening braces.
        offset: usize,
    },

    /// A placeholder name contains characters outside `[A-Za-z0-9_]`.
    #[error("Invalid placeholder name '{name}' at byte {offset}")]
    InvalidName {
        /// The text found between the braces.
        name: String,
        /// Byte offset of the opening braces.
        offset: usize,
    },

    /// A placeholder is not one of the variables the template accepts.
    #[error("Unknown placeholder '{{{{{name}}}}}'; supported: {}", format_allowed(.allowed))]
    UnknownPlaceholder {
        /// The offending placeholder name.
        name: String,
        /// The variables this template may use.
        allowed: Vec<String>,
    },

    /// Rendering found a placeholder with no value.
    #[error("No value for placeholder '{{{{{0}}}}}'")]
    MissingVariable(String),
}

fn format_allowed(allowed: &[String]) -> String {
    if allowed.is_empty() {
        "none".to_string()
    } else {
        allowed
            .iter()
            .map(|a| format!("{{{{{a}}}}}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied to the output as is.
    Literal(String),
    /// A `{{name}}` substitution.
    Placeholder(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

#[allow(clippy::expect_used)]
fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder pattern is valid"))
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Template {
    /// Parses a template string.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut cursor = 0;

        for caps in placeholder_regex().captures_iter(source) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            let literal = &source[cursor..whole.start()];
            if let Some(pos) = literal.find("{{") {
                return Err(TemplateError::Unterminated {
                    offset: cursor + pos,
                });
            }
            if !literal.is_empty() {
                segments.push(Segment::Literal(literal.to_string()));
            }

            let name = inner.as_str().trim();
            if !is_valid_name(name) {
                return Err(TemplateError::InvalidName {
                    name: name.to_string(),
                    offset: whole.start(),
                });
            }
            segments.push(Segment::Placeholder(name.to_string()));
            cursor = whole.end();
        }

        let rest = &source[cursor..];
        if let Some(pos) = rest.find("{{") {
            return Err(TemplateError::Unterminated {
                offset: cursor + pos,
            });
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Returns the original template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns placeholder names in order of first appearance, without duplicates.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Fails on the first placeholder not in `allowed`.
    pub fn check_placeholders(&self, allowed: &[&str]) -> Result<(), TemplateError> {
        for name in self.placeholders() {
            if !allowed.contains(&name) {
                return Err(TemplateError::UnknownPlaceholder {
                    name: name.to_string(),
                    allowed: allowed.iter().map(ToString::to_string).collect(),
                });
            }
        }
        Ok(())
    }

    /// Substitutes every placeholder with its value.
    ///
    /// Values are inserted verbatim: braces inside a value are never expanded.
    pub fn render(&self, vars: &Variables) -> Result<String, TemplateError> {
        let mut output = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Placeholder(name) => {
                    let value = vars
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingVariable(name.clone()))?;
                    output.push_str(value);
                }
            }
        }
        Ok(output)
    }
}

/// Values available to a single render.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: HashMap<String, String>,
}

impl Variables {
    /// Creates an empty variable set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// Sets a value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Looks up a value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}
