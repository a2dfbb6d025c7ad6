//! Registry of evaluation runs keyed by evaluation key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::method::EvaluationMethodConfig;
use crate::results::ResultsDict;
use crate::{Error, Result};

/// Metadata stored for one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub key: String,
    pub config: EvaluationMethodConfig,
}

impl RunInfo {
    pub fn new(key: impl Into<String>, config: EvaluationMethodConfig) -> Self {
        Self {
            key: key.into(),
            config,
        }
    }
}

/// Storage for evaluation runs and their persisted results.
pub trait RunRegistry {
    /// Run registered under `key`, if any.
    fn get_run_info(&self, key: &str) -> Option<RunInfo>;

    /// Register a run, replacing any run under the same key.
    fn register_run(&mut self, info: RunInfo) -> Result<()>;

    /// Persist the results of a registered run.
    ///
    /// # Errors
    /// `Error::RunNotFound` if no run is registered under `key`.
    fn save_run_results(&mut self, key: &str, results: ResultsDict) -> Result<()>;

    /// Persisted results of a run.
    ///
    /// # Errors
    /// `Error::RunNotFound` if the run is unknown or has no results yet.
    fn load_run_results(&self, key: &str) -> Result<ResultsDict>;

    /// Remove a run and its results.
    fn delete_run(&mut self, key: &str) -> Result<()>;

    /// Keys of all registered runs, sorted.
    fn keys(&self) -> Vec<String>;
}

#[derive(Debug, Clone)]
struct RunEntry {
    info: RunInfo,
    results: Option<ResultsDict>,
}

/// In-memory run registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunRegistry {
    runs: BTreeMap<String, RunEntry>,
}

impl InMemoryRunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

impl RunRegistry for InMemoryRunRegistry {
    fn get_run_info(&self, key: &str) -> Option<RunInfo> {
        self.runs.get(key).map(|entry| entry.info.clone())
    }

    fn register_run(&mut self, info: RunInfo) -> Result<()> {
        let key = info.key.clone();
        self.runs.insert(key, RunEntry { info, results: None });
        Ok(())
    }

    fn save_run_results(&mut self, key: &str, results: ResultsDict) -> Result<()> {
        let entry = self
            .runs
            .get_mut(key)
            .ok_or_else(|| Error::RunNotFound(key.to_string()))?;
        entry.results = Some(results);
        Ok(())
    }

    fn load_run_results(&self, key: &str) -> Result<ResultsDict> {
        self.runs
            .get(key)
            .and_then(|entry| entry.results.clone())
            .ok_or_else(|| Error::RunNotFound(key.to_string()))
    }

    fn delete_run(&mut self, key: &str) -> Result<()> {
        self.runs
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::RunNotFound(key.to_string()))
    }

    fn keys(&self) -> Vec<String> {
        self.runs.keys().cloned().collect()
    }
}
