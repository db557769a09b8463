// Setup resolution - configuration to ordered reporter specs

use crate::error::{MultiError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// String options, in declaration order
pub type OptionMap = IndexMap<String, String>;

/// One reporter to instantiate: its name, where it writes, its own options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterSpec {
    pub name: String,
    pub destination: String,
    pub options: Option<OptionMap>,
}

impl ReporterSpec {
    pub fn new(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: OptionMap) -> Self {
        self.options = Some(options);
        self
    }
}

/// Value of one entry in a structured reporter mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReporterEntry {
    /// `spec = "-"`
    Destination(String),
    /// `junit = { destination = "out.xml", options = { ... } }`
    Detailed {
        #[serde(alias = "stdout")]
        destination: String,
        #[serde(
            default,
            deserialize_with = "deserialize_optional_options",
            skip_serializing_if = "Option::is_none"
        )]
        options: Option<OptionMap>,
    },
}

/// Parse the whitespace-separated `name=destination` form
pub fn parse_setup(definition: &str) -> Result<Vec<ReporterSpec>> {
    let fields: Vec<&str> = definition.split_whitespace().collect();
    if fields.is_empty() {
        return Err(MultiError::NoDefinitions);
    }

    debug!("Got reporter defs: {:?}", fields);
    fields.into_iter().map(parse_reporter).collect()
}

/// Parse one `name=destination` field
pub fn parse_reporter(definition: &str) -> Result<ReporterSpec> {
    let invalid = || MultiError::InvalidDefinition {
        definition: definition.to_string(),
    };

    let mut parts = definition.split('=');
    let (Some(name), Some(destination), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    if name.is_empty() || destination.is_empty() {
        return Err(invalid());
    }

    Ok(ReporterSpec::new(name, destination))
}

/// Convert a structured mapping, keeping its order
pub fn from_mapping(reporters: &IndexMap<String, ReporterEntry>) -> Vec<ReporterSpec> {
    reporters
        .iter()
        .map(|(name, entry)| {
            debug!("adding reporter {} {:?}", name, entry);
            match entry {
                ReporterEntry::Destination(destination) => ReporterSpec::new(name, destination),
                ReporterEntry::Detailed {
                    destination,
                    options,
                } => ReporterSpec {
                    name: name.clone(),
                    destination: destination.clone(),
                    options: options.clone(),
                },
            }
        })
        .collect()
}

/// Pick the setup source: a non-empty mapping wins, otherwise the string
/// definition is parsed (a missing definition counts as empty).
pub fn resolve_setup(
    mapping: Option<&IndexMap<String, ReporterEntry>>,
    definition: Option<&str>,
) -> Result<Vec<ReporterSpec>> {
    let setup = match mapping {
        Some(reporters) if !reporters.is_empty() => from_mapping(reporters),
        _ => parse_setup(definition.unwrap_or_default())?,
    };

    debug!("setup {:?}", setup);
    Ok(setup)
}

/// Deserialize a map of scalars into strings, whatever their source type
pub fn deserialize_options<'de, D>(deserializer: D) -> std::result::Result<OptionMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
    Ok(stringify(raw))
}

fn deserialize_optional_options<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<OptionMap>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw.map(stringify))
}

fn stringify(raw: IndexMap<String, Value>) -> OptionMap {
    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setup_keeps_order() {
        let setup = parse_setup("  spec=-   junit=out/junit.xml\tdot=- ").unwrap();
        let names: Vec<_> = setup.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["spec", "junit", "dot"]);
        assert_eq!(setup[1].destination, "out/junit.xml");
        assert!(setup[1].options.is_none());
    }

    #[test]
    fn test_blank_definition_is_no_definitions() {
        assert!(matches!(parse_setup(""), Err(MultiError::NoDefinitions)));
        assert!(matches!(parse_setup(" \t\n"), Err(MultiError::NoDefinitions)));
    }

    #[test]
    fn test_invalid_fields() {
        for field in ["bogus!!!", "a=b=c", "=file", "spec="] {
            let err = parse_reporter(field).unwrap_err();
            assert!(err.is_configuration(), "{} should be rejected", field);
        }
    }

    #[test]
    fn test_same_reporter_twice() {
        let setup = parse_setup("json=a.json json=b.json").unwrap();
        assert_eq!(setup.len(), 2);
        assert_eq!(setup[0].name, setup[1].name);
    }

    #[test]
    fn test_mapping_wins_when_not_empty() {
        let mut mapping = IndexMap::new();
        mapping.insert("tap".to_string(), ReporterEntry::Destination("-".into()));

        let setup = resolve_setup(Some(&mapping), Some("spec=-")).unwrap();
        assert_eq!(setup, vec![ReporterSpec::new("tap", "-")]);

        let setup = resolve_setup(Some(&IndexMap::new()), Some("spec=-")).unwrap();
        assert_eq!(setup, vec![ReporterSpec::new("spec", "-")]);
    }

    #[test]
    fn test_entry_accepts_stdout_alias_and_scalar_options() {
        let entry: ReporterEntry = serde_json::from_str(
            r#"{"stdout": "/tmp/x.txt", "options": {"retries": 3, "name": "n"}}"#,
        )
        .unwrap();

        let ReporterEntry::Detailed {
            destination,
            options,
        } = entry
        else {
            panic!("expected detailed entry");
        };
        let options = options.unwrap();
        assert_eq!(destination, "/tmp/x.txt");
        assert_eq!(options["retries"], "3");
        assert_eq!(options["name"], "n");
    }
}
