//! Module graph used for link-time export validation.
//!
//! The graph owns one entry per module identity. Compiled ES modules keep
//! their immutable [`CompileResult`] alongside a working copy of their export
//! table, which star resolution extends in place. Specifier-to-child links
//! are recorded here rather than on the compile result, so the same result
//! can be shared between graphs.

use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::CompileCache;
use crate::compiler::{compile, CompileResult, ExportedSpecifier};
use crate::options::{CompileOptions, SourceType};
use crate::validate::{self, CompilerError, ResolvedExport};

pub type ModuleId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Esm,
    CommonJs,
    Builtin,
}

#[derive(Debug)]
pub struct ModuleEntry {
    pub id: ModuleId,
    pub kind: ModuleKind,
    pub compiled: Option<Arc<CompileResult>>,
    /// Import specifier text to the module it resolved to.
    pub children: IndexMap<String, ModuleId>,
    pub exported_specifiers: IndexMap<String, ExportedSpecifier>,
    pub(crate) stars_resolved: bool,
}

impl ModuleEntry {
    fn new(id: &str, kind: ModuleKind, compiled: Option<Arc<CompileResult>>) -> Self {
        let exported_specifiers = compiled
            .as_ref()
            .map(|result| result.exported_specifiers.clone())
            .unwrap_or_default();

        ModuleEntry {
            id: id.to_string(),
            kind,
            compiled,
            children: IndexMap::new(),
            exported_specifiers,
            stars_resolved: false,
        }
    }

    fn reset_exports(&mut self) {
        if let Some(compiled) = &self.compiled {
            self.exported_specifiers = compiled.exported_specifiers.clone();
        }
        self.stars_resolved = false;
    }
}

#[derive(Debug, Default)]
pub struct ModuleGraph {
    entries: IndexMap<ModuleId, ModuleEntry>,
    /// Allow named imports from CommonJS modules.
    pub cjs_named_exports: bool,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cjs_named_exports(mut self, enabled: bool) -> Self {
        self.cjs_named_exports = enabled;
        self
    }

    /// Register a compiled module. Results that stayed scripts are treated
    /// as CommonJS.
    pub fn insert_compiled(&mut self, id: &str, compiled: Arc<CompileResult>) {
        let kind = match compiled.source_type {
            SourceType::Module => ModuleKind::Esm,
            _ => ModuleKind::CommonJs,
        };
        self.entries
            .insert(id.to_string(), ModuleEntry::new(id, kind, Some(compiled)));
    }

    pub fn insert_commonjs(&mut self, id: &str) {
        self.entries
            .insert(id.to_string(), ModuleEntry::new(id, ModuleKind::CommonJs, None));
    }

    pub fn insert_builtin(&mut self, id: &str) {
        self.entries
            .insert(id.to_string(), ModuleEntry::new(id, ModuleKind::Builtin, None));
    }

    /// Record that `specifier` in `parent` resolved to `child`.
    pub fn link(&mut self, parent: &str, specifier: &str, child: &str) -> Result<(), CompilerError> {
        if !self.entries.contains_key(child) {
            return Err(CompilerError::unknown_module(child));
        }
        let Some(entry) = self.entries.get_mut(parent) else {
            return Err(CompilerError::unknown_module(parent));
        };

        entry
            .children
            .insert(specifier.to_string(), child.to_string());
        entry.reset_exports();
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ModuleEntry> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ModuleEntry> {
        self.entries.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `target` is reachable from `ancestor` through its children.
    pub fn is_descendant(&self, ancestor: &str, target: &str) -> bool {
        let mut seen = HashSet::new();
        let mut stack: Vec<&str> = match self.entries.get(ancestor) {
            Some(entry) => entry.children.values().map(String::as_str).collect(),
            None => return false,
        };

        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(entry) = self.entries.get(id) {
                stack.extend(entry.children.values().map(String::as_str));
            }
        }

        false
    }

    /// Compile independent sources in parallel and register the results in
    /// input order. The first failure is returned tagged with its module id.
    pub fn compile_all(
        &mut self,
        sources: &[(ModuleId, String)],
        options: &CompileOptions,
        cache: Option<&CompileCache>,
    ) -> Result<(), CompilerError> {
        let results: Vec<Result<Arc<CompileResult>, CompilerError>> = sources
            .par_iter()
            .map(|(id, source)| {
                let compiled = match cache {
                    Some(cache) => cache.get_or_compile(source, options),
                    None => compile(source, options).map(Arc::new),
                };
                compiled.map_err(|mut error| {
                    error.module.get_or_insert_with(|| id.clone());
                    error
                })
            })
            .collect();

        for ((id, _), result) in sources.iter().zip(results) {
            self.insert_compiled(id, result?);
        }

        tracing::debug!(modules = sources.len(), "compiled module batch");
        Ok(())
    }

    pub fn validate(&mut self, id: &str) -> Result<(), CompilerError> {
        validate::validate(self, id)
    }

    /// Follow `name` exported by `id` to the module that defines it.
    pub fn resolve_export(&mut self, id: &str, name: &str) -> Result<Option<ResolvedExport>, CompilerError> {
        validate::resolve_exported_stars(self, id, &mut HashSet::new());
        validate::resolve_exported_name(self, id, name, &mut HashSet::new())
    }
}
