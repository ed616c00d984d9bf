use std::collections::BTreeMap;

use tracing::debug;

use crate::document::Document;
use crate::model::ApplyReport;

/// Where [`apply`] writes exported rows.
///
/// Defaults to an empty in-memory map, so nothing touches the process unless
/// a caller opts in through [`TargetEnv::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEnv {
    sink: Sink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sink {
    Process,
    Map(BTreeMap<String, String>),
}

impl Default for TargetEnv {
    fn default() -> Self {
        Self::memory()
    }
}

impl TargetEnv {
    /// Export into the environment of the running process.
    ///
    /// # Safety
    ///
    /// Exporting calls [`std::env::set_var`]. No other thread may read or
    /// write the process environment while a document is applied to this
    /// target.
    pub unsafe fn process() -> Self {
        Self {
            sink: Sink::Process,
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(BTreeMap::new())
    }

    /// Export into `map`, keeping whatever it already holds.
    pub fn from_memory(map: BTreeMap<String, String>) -> Self {
        Self {
            sink: Sink::Map(map),
        }
    }

    pub fn as_memory(&self) -> Option<&BTreeMap<String, String>> {
        match &self.sink {
            Sink::Map(map) => Some(map),
            Sink::Process => None,
        }
    }

    pub fn as_memory_mut(&mut self) -> Option<&mut BTreeMap<String, String>> {
        match &mut self.sink {
            Sink::Map(map) => Some(map),
            Sink::Process => None,
        }
    }

    fn contains_key(&self, key: &str) -> bool {
        match &self.sink {
            Sink::Process => std::env::var_os(key).is_some(),
            Sink::Map(map) => map.contains_key(key),
        }
    }

    fn set_var(&mut self, key: &str, value: &str) {
        match &mut self.sink {
            // SAFETY: `Sink::Process` is only built by the unsafe
            // `TargetEnv::process`, whose caller guarantees exclusive access.
            Sink::Process => unsafe { std::env::set_var(key, value) },
            Sink::Map(map) => {
                map.insert(key.to_owned(), value.to_owned());
            }
        }
    }
}

/// Export every live row of `document` into `target` under its full key.
///
/// Commented-out rows are never exported. With `override_existing` unset,
/// variables already present in the target keep their value.
pub fn apply(document: &Document, target: &mut TargetEnv, override_existing: bool) -> ApplyReport {
    let mut report = ApplyReport::default();

    for entry in document.entries() {
        if !override_existing && target.contains_key(&entry.key) {
            debug!(key = %entry.key, "skipping existing variable");
            report.skipped_existing += 1;
            continue;
        }

        target.set_var(&entry.key, &entry.value);
        report.loaded += 1;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    fn host(target: &TargetEnv) -> Option<&str> {
        target.as_memory()?.get("HOST").map(String::as_str)
    }

    #[test]
    fn applies_live_rows_with_full_keys() {
        let doc = parse_str("APP_ENV=prod\n# APP_DEBUG=true\nHOST=localhost\n")
            .expect("parse should succeed");
        let mut target = TargetEnv::memory();

        let report = apply(&doc, &mut target, false);

        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped_existing, 0);
        let map = target.as_memory().expect("memory target");
        assert_eq!(map.get("APP_ENV").expect("APP_ENV"), "prod");
        assert_eq!(map.get("HOST").expect("HOST"), "localhost");
        assert!(!map.contains_key("APP_DEBUG"));
    }

    #[test]
    fn keeps_existing_values_unless_overriding() {
        let doc = parse_str("HOST=file\n").expect("parse should succeed");
        let mut initial = BTreeMap::new();
        initial.insert("HOST".to_owned(), "existing".to_owned());

        let mut target = TargetEnv::from_memory(initial.clone());
        let report = apply(&doc, &mut target, false);
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(host(&target), Some("existing"));

        let mut target = TargetEnv::from_memory(initial);
        let report = apply(&doc, &mut target, true);
        assert_eq!(report.loaded, 1);
        assert_eq!(host(&target), Some("file"));
    }
}
