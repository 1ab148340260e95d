//! Flat parameter database.
//!
//! Runs are configured from `key = value` files plus command-line overrides.
//! Typed getters name the offending parameter path in their error, so a
//! misconfigured run tells the operator exactly which line to fix.

use crate::Result;
use crate::fitness::ObjectiveSpec;
use brood_error::brood_err;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct ParameterDatabase {
    values: HashMap<String, String>,
}

impl ParameterDatabase {
    pub fn new() -> Self {
        ParameterDatabase::default()
    }

    /// Load a parameter file: one `key = value` per line, `#` comments,
    /// blank lines ignored.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let mut db = ParameterDatabase::new();
        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(brood_err!(InvalidParameter:
                    "{}:{}: expected 'key = value', got '{}'", path.display(), number + 1, line));
            };
            db.set(key.trim(), value.trim());
        }
        Ok(db)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
            .map(str::to_owned)
            .ok_or_else(|| brood_err!(InvalidParameter: "no value for '{}'", key))
    }

    pub fn get_usize(&self, key: &str) -> Result<usize> {
        let raw = self.get_string(key)?;
        raw.parse()
            .map_err(|_| brood_err!(InvalidParameter: "'{}' is not a valid integer for '{}'", raw, key))
    }

    pub fn get_u16(&self, key: &str) -> Result<u16> {
        let raw = self.get_string(key)?;
        raw.parse()
            .map_err(|_| brood_err!(InvalidParameter: "'{}' is not a valid port for '{}'", raw, key))
    }

    pub fn get_u64(&self, key: &str) -> Result<u64> {
        let raw = self.get_string(key)?;
        raw.parse()
            .map_err(|_| brood_err!(InvalidParameter: "'{}' is not a valid integer for '{}'", raw, key))
    }

    pub fn get_f32(&self, key: &str) -> Result<f32> {
        let raw = self.get_string(key)?;
        raw.parse()
            .map_err(|_| brood_err!(InvalidParameter: "'{}' is not a valid real for '{}'", raw, key))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let raw = self.get_string(key)?;
        match raw.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(brood_err!(InvalidParameter:
                "'{}' is not 'true' or 'false' for '{}'", other, key)),
        }
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        if self.has(key) { self.get_bool(key) } else { Ok(default) }
    }

    pub fn get_usize_or(&self, key: &str, default: usize) -> Result<usize> {
        if self.has(key) { self.get_usize(key) } else { Ok(default) }
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_owned()
    }

    /// Build the shared objective spec from the `multi.*` parameter family:
    /// `multi.num-objectives`, `multi.maximize`, and global or per-objective
    /// `multi.min` / `multi.max` bounds (`multi.min.2` overrides `multi.min`
    /// for objective 2). Returns `None` when `multi.num-objectives` is
    /// absent, meaning the run uses scalar fitness.
    pub fn objective_spec(&self) -> Result<Option<ObjectiveSpec>> {
        if !self.has("multi.num-objectives") {
            return Ok(None);
        }

        let count = self.get_usize("multi.num-objectives")?;
        if count == 0 {
            return Err(brood_err!(InvalidConfig: "multi.num-objectives must be >= 1"));
        }
        let maximize = self.get_bool_or("multi.maximize", true)?;

        let mut min = Vec::with_capacity(count);
        let mut max = Vec::with_capacity(count);
        for i in 0..count {
            let lo_key = format!("multi.min.{}", i);
            let hi_key = format!("multi.max.{}", i);
            min.push(if self.has(&lo_key) {
                self.get_f32(&lo_key)?
            } else {
                self.get_f32("multi.min")?
            });
            max.push(if self.has(&hi_key) {
                self.get_f32(&hi_key)?
            } else {
                self.get_f32("multi.max")?
            });
        }

        ObjectiveSpec::new(maximize, min, max).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters_name_the_parameter() {
        let mut db = ParameterDatabase::new();
        db.set("eval.master.port", "not-a-port");

        let err = db.get_u16("eval.master.port").unwrap_err();
        assert!(err.to_string().contains("eval.master.port"));

        let err = db.get_usize("es.mu.0").unwrap_err();
        assert!(err.to_string().contains("es.mu.0"));
    }

    #[test]
    fn test_bool_parsing() {
        let mut db = ParameterDatabase::new();
        db.set("eval.compression", "true");
        db.set("eval.return-inds", "yes");

        assert!(db.get_bool("eval.compression").unwrap());
        assert!(db.get_bool("eval.return-inds").is_err());
        assert!(!db.get_bool_or("run-evolve", false).unwrap());
    }

    #[test]
    fn test_objective_spec_with_overrides() {
        let mut db = ParameterDatabase::new();
        db.set("multi.num-objectives", "3");
        db.set("multi.maximize", "false");
        db.set("multi.min", "0");
        db.set("multi.max", "1");
        db.set("multi.max.1", "5");

        let spec = db.objective_spec().unwrap().unwrap();
        assert_eq!(spec.num_objectives(), 3);
        assert!(!spec.maximize());
        assert_eq!(spec.max(), &[1.0, 5.0, 1.0]);
    }

    #[test]
    fn test_objective_spec_absent_means_scalar() {
        let db = ParameterDatabase::new();
        assert!(db.objective_spec().unwrap().is_none());
    }
}
