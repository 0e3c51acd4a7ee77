use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use crate::compiler::{compile, CompileResult};
use crate::options::CompileOptions;
use crate::validate::CompilerError;

/// Compile results keyed by source content and output-affecting options.
///
/// Owned by the caller and passed where it is needed; there is no global
/// instance. Shared results are safe to hand out because their only mutable
/// state (lazy code and the TDZ pass) is internally synchronized.
#[derive(Debug, Default)]
pub struct CompileCache {
    entries: RwLock<HashMap<String, Arc<CompileResult>>>,
}

impl CompileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute_hash(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn key(source: &str, options: &CompileOptions) -> String {
        format!("{}:{}", Self::compute_hash(source), options.fingerprint())
    }

    pub fn get(&self, source: &str, options: &CompileOptions) -> Option<Arc<CompileResult>> {
        self.entries.read().get(&Self::key(source, options)).cloned()
    }

    pub fn set(&self, source: &str, options: &CompileOptions, result: Arc<CompileResult>) {
        self.entries.write().insert(Self::key(source, options), result);
    }

    pub fn get_or_compile(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<Arc<CompileResult>, CompilerError> {
        let key = Self::key(source, options);
        if let Some(hit) = self.entries.read().get(&key) {
            tracing::trace!(key = %key, "compile cache hit");
            return Ok(hit.clone());
        }

        let result = Arc::new(compile(source, options)?);
        // A concurrent miss may have filled the slot first; keep that one.
        let mut entries = self.entries.write();
        Ok(entries.entry(key).or_insert(result).clone())
    }

    /// Drop every cached result for `source`, whatever options produced it.
    pub fn invalidate(&self, source: &str) -> usize {
        let prefix = format!("{}:", Self::compute_hash(source));
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(&prefix));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
