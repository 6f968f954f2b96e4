//! YAML processing utilities.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use yaml_rust_davvid::{Yaml, YamlEmitter};

/// Serializes a value to YAML, writing multi-line strings as block scalars.
///
/// Templates such as `"\n#### {{heading}}\n"` stay readable this way instead
/// of turning into escaped one-liners. Block scalars keep exactly one trailing
/// newline, so when a string would not survive that (no trailing newline, or
/// several) the document is emitted with quoted strings instead.
pub fn to_yaml<T: Serialize>(data: &T) -> Result<String> {
    let serde_value = serde_yaml::to_value(data).context("Failed to serialize to serde value")?;
    let yaml = convert_serde_to_yaml_rust(&serde_value);

    let block = emit(&yaml, true)?;
    if round_trips(&block, &serde_value) {
        return Ok(block);
    }

    debug!("Block scalars would change string values; emitting quoted strings");
    emit(&yaml, false)
}

fn emit(yaml: &Yaml, multiline: bool) -> Result<String> {
    let mut output = String::new();
    let mut emitter = YamlEmitter::new(&mut output);
    emitter.multiline_strings(multiline);
    emitter.dump(yaml).context("Failed to emit YAML")?;
    Ok(output)
}

fn round_trips(text: &str, expected: &serde_yaml::Value) -> bool {
    serde_yaml::from_str::<serde_yaml::Value>(text).is_ok_and(|parsed| &parsed == expected)
}

/// Converts `serde_yaml::Value` into the emitter's document model.
fn convert_serde_to_yaml_rust(value: &serde_yaml::Value) -> Yaml {
    match value {
        serde_yaml::Value::Null => Yaml::Null,
        serde_yaml::Value::Bool(b) => Yaml::Boolean(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Yaml::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Yaml::Real(f.to_string())
            } else {
                Yaml::String(n.to_string())
            }
        }
        serde_yaml::Value::String(s) => Yaml::String(s.clone()),
        serde_yaml::Value::Sequence(seq) => {
            Yaml::Array(seq.iter().map(convert_serde_to_yaml_rust).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let mut hash = yaml_rust_davvid::yaml::Hash::new();
            for (k, v) in map {
                hash.insert(convert_serde_to_yaml_rust(k), convert_serde_to_yaml_rust(v));
            }
            Yaml::Hash(hash)
        }
        serde_yaml::Value::Tagged(tagged) => convert_serde_to_yaml_rust(&tagged.value),
    }
}

/// Deserializes a YAML string.
pub fn from_yaml<T: for<'de> Deserialize<'de>>(yaml: &str) -> Result<T> {
    serde_yaml::from_str(yaml).context("Failed to deserialize YAML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChangelogConfig;

    #[test]
    fn to_yaml_renders_config_keys() {
        let yaml = to_yaml(&ChangelogConfig::default()).unwrap();
        assert!(yaml.contains("dataSource: issues"));
        assert!(yaml.contains("changelogFilename: CHANGELOG.md"));
        assert!(yaml.contains("onlyMilestones: false"));

        let parsed: ChangelogConfig = from_yaml(&yaml).unwrap();
        assert_eq!(parsed.changelog_filename, "CHANGELOG.md");
    }

    #[test]
    fn to_yaml_default_config_loads_back_unchanged() {
        let config = ChangelogConfig::default();
        let parsed: ChangelogConfig = from_yaml(&to_yaml(&config).unwrap()).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.template.changelog_title, "# Changelog\n\n");
        assert_eq!(parsed.template.release_separator, "\n");
    }

    #[test]
    fn to_yaml_keeps_every_trailing_newline_shape() {
        let mut config = ChangelogConfig::default();
        config.template.issue = "- {{name}}\n  {{url}}".to_string();
        config.template.group = "\n### {{heading}}\n\n\n".to_string();
        config.template.release = "## {{release}}\n{{body}}\n".to_string();

        let parsed: ChangelogConfig = from_yaml(&to_yaml(&config).unwrap()).unwrap();
        assert_eq!(parsed.template, config.template);
    }

    #[test]
    fn to_yaml_uses_block_scalars_when_lossless() {
        let value = serde_yaml::to_value(vec!["first line\nsecond line\n"]).unwrap();
        let yaml = to_yaml(&value).unwrap();
        let parsed: Vec<String> = from_yaml(&yaml).unwrap();
        assert_eq!(parsed, vec!["first line\nsecond line\n".to_string()]);
    }

    #[test]
    fn from_yaml_reports_errors() {
        let result: Result<ChangelogConfig> = from_yaml("groupBy: [1, 2");
        assert!(result.is_err());
    }
}
