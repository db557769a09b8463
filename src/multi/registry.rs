// Reporter registry - name to constructor, built-ins first

use super::redirect::{Output, OutputRedirector};
use super::setup::OptionMap;
use super::shim::RunnerShim;
use crate::error::{MultiError, Result};
use crate::events::EventSource;
use crate::report::{self, Reporter};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Key under which a reporter finds its own options
pub const REPORTER_OPTIONS_KEY: &str = "reporterOptions";

/// Options handed to a reporter: `{ ...shared, reporterOptions: {...own} }`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReporterOptions(Map<String, Value>);

impl ReporterOptions {
    /// Shallow-merge shared options with one reporter's own options.
    ///
    /// The reporter's options always land under `reporterOptions`, as an empty
    /// object when it has none, replacing any shared key of that name.
    pub fn merged(shared: &OptionMap, own: Option<&OptionMap>) -> Self {
        let mut map: Map<String, Value> = shared
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        let own: Map<String, Value> = own
            .into_iter()
            .flatten()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        map.insert(REPORTER_OPTIONS_KEY.to_string(), Value::Object(own));

        Self(map)
    }

    /// Shared option
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// This reporter's own option
    pub fn reporter_option(&self, key: &str) -> Option<&str> {
        self.reporter_options()
            .and_then(|options| options.get(key))
            .and_then(Value::as_str)
    }

    /// Own option first, then shared option
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.reporter_option(key).or_else(|| self.get(key))
    }

    /// The `reporterOptions` object; always present on merged options
    pub fn reporter_options(&self) -> Option<&Map<String, Value>> {
        self.0.get(REPORTER_OPTIONS_KEY).and_then(Value::as_object)
    }

    pub fn as_json(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Everything a reporter receives at construction besides its event source
#[derive(Clone)]
pub struct ReporterContext {
    pub output: Output,
    pub error_output: Output,
    pub options: ReporterOptions,
}

impl ReporterContext {
    /// Context writing to the redirector's default channels
    pub fn new(redirector: &Arc<OutputRedirector>, options: ReporterOptions) -> Self {
        Self {
            output: redirector.output(),
            error_output: redirector.error_output(),
            options,
        }
    }
}

/// Builds a reporter subscribed to `source`
pub type ReporterConstructor =
    Arc<dyn Fn(&dyn EventSource, ReporterContext) -> Arc<dyn Reporter> + Send + Sync>;

/// Where a registered name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterOrigin {
    Builtin,
    External,
}

impl ReporterOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::External => "external",
        }
    }
}

/// Explicit lookup table of reporter constructors.
///
/// Resolution checks the built-in table first and the external table second.
pub struct ReporterRegistry {
    builtin: IndexMap<String, ReporterConstructor>,
    external: IndexMap<String, ReporterConstructor>,
}

impl Default for ReporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ReporterRegistry {
    /// Registry holding the reporters shipped with this crate
    pub fn new() -> Self {
        let builtin = report::builtin_reporters()
            .into_iter()
            .map(|(name, ctor)| (name.to_string(), ctor))
            .collect();

        Self {
            builtin,
            external: IndexMap::new(),
        }
    }

    /// Registry with no reporters at all
    pub fn empty() -> Self {
        Self {
            builtin: IndexMap::new(),
            external: IndexMap::new(),
        }
    }

    /// Register an externally supplied reporter. A later registration under
    /// the same name replaces the earlier one.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&dyn EventSource, ReporterContext) -> Arc<dyn Reporter> + Send + Sync + 'static,
    {
        self.external.insert(name.into(), Arc::new(constructor));
        self
    }

    pub fn resolve(&self, name: &str) -> Result<ReporterConstructor> {
        let constructor = self
            .builtin
            .get(name)
            .or_else(|| self.external.get(name))
            .cloned()
            .ok_or_else(|| MultiError::UnknownReporter {
                name: name.to_string(),
            })?;

        debug!("Resolved reporter '{}'", name);
        Ok(constructor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builtin.contains_key(name) || self.external.contains_key(name)
    }

    /// Every registered name with its origin, built-ins first
    pub fn names(&self) -> Vec<(&str, ReporterOrigin)> {
        self.builtin
            .keys()
            .map(|name| (name.as_str(), ReporterOrigin::Builtin))
            .chain(
                self.external
                    .keys()
                    .filter(|name| !self.builtin.contains_key(*name))
                    .map(|name| (name.as_str(), ReporterOrigin::External)),
            )
            .collect()
    }

    /// Construct `name` against `shim`, inside the shim's output window so
    /// that anything the constructor prints lands in the reporter's own sink.
    pub fn instantiate(
        &self,
        name: &str,
        shim: &Arc<RunnerShim>,
        redirector: &Arc<OutputRedirector>,
        options: ReporterOptions,
    ) -> Result<Arc<dyn Reporter>> {
        let constructor = self.resolve(name)?;
        let context = ReporterContext::new(redirector, options);
        debug!("Shimming runner into reporter '{}'", name);
        Ok(shim.scoped(|| constructor(&**shim, context)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Silent;

    impl Reporter for Silent {}

    fn options(pairs: &[(&str, &str)]) -> OptionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_merged_options_shape() {
        let shared = options(&[("color", "false"), ("reporterOptions", "clobbered")]);
        let own = options(&[("output", "x.xml")]);

        let merged = ReporterOptions::merged(&shared, Some(&own));

        assert_eq!(
            merged.as_json(),
            json!({"color": "false", "reporterOptions": {"output": "x.xml"}})
        );
        assert_eq!(merged.reporter_option("output"), Some("x.xml"));
        assert_eq!(merged.lookup("color"), Some("false"));
    }

    #[test]
    fn test_missing_own_options_become_empty_object() {
        let merged = ReporterOptions::merged(&OptionMap::new(), None);
        assert_eq!(merged.as_json(), json!({"reporterOptions": {}}));
        assert_eq!(merged.reporter_options().map(Map::len), Some(0));
    }

    #[test]
    fn test_builtin_wins_over_external() {
        let mut registry = ReporterRegistry::new();
        registry.register("spec", |_, _| Arc::new(Silent) as Arc<dyn Reporter>);
        registry.register("custom", |_, _| Arc::new(Silent) as Arc<dyn Reporter>);

        let names = registry.names();

        assert!(names.contains(&("spec", ReporterOrigin::Builtin)));
        assert!(names.contains(&("custom", ReporterOrigin::External)));
        assert!(!names.contains(&("spec", ReporterOrigin::External)));
    }

    #[test]
    fn test_unknown_reporter_is_fatal_error() {
        let registry = ReporterRegistry::empty();
        let err = registry.resolve("doesnotexist").err().unwrap();
        assert!(matches!(err, MultiError::UnknownReporter { ref name } if name == "doesnotexist"));
    }
}
