use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::compiler::ExportedSpecifier;
use crate::graph::{ModuleGraph, ModuleId, ModuleKind};
use crate::options::SourceType;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_SYNTAX: &str = "ERR_SYNTAX";
pub const ERR_INVALID_META_PROPERTY: &str = "ERR_INVALID_META_PROPERTY";
pub const ERR_IMPORT_META_OUTSIDE_MODULE: &str = "ERR_IMPORT_META_OUTSIDE_MODULE";
pub const ERR_EXPORT_MISSING: &str = "ERR_EXPORT_MISSING";
pub const ERR_EXPORT_STAR_CONFLICT: &str = "ERR_EXPORT_STAR_CONFLICT";
pub const ERR_EXPORT_CYCLE: &str = "ERR_EXPORT_CYCLE";
pub const ERR_UNKNOWN_MODULE: &str = "ERR_UNKNOWN_MODULE";
pub const ERR_INVALID_OPTION: &str = "ERR_INVALID_OPTION";

fn error_type(code: &str) -> &'static str {
    match code {
        ERR_SYNTAX
        | ERR_INVALID_META_PROPERTY
        | ERR_IMPORT_META_OUTSIDE_MODULE
        | ERR_EXPORT_MISSING
        | ERR_EXPORT_STAR_CONFLICT
        | ERR_EXPORT_CYCLE => "SyntaxError",
        ERR_INVALID_OPTION => "TypeError",
        _ => "Error",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{error_type}: {message}")]
pub struct CompilerError {
    pub code: String,
    pub error_type: String,
    pub message: String,
    /// Grammar that was being parsed when a syntax error surfaced.
    pub source_type: Option<SourceType>,
    /// Module the error is reported against during linking.
    pub module: Option<String>,
    pub location: Option<SourceLocation>,
}

impl CompilerError {
    pub fn new(code: &str, message: &str) -> Self {
        CompilerError {
            code: code.to_string(),
            error_type: error_type(code).to_string(),
            message: message.to_string(),
            source_type: None,
            module: None,
            location: None,
        }
    }

    pub fn syntax(message: &str, source_type: SourceType) -> Self {
        Self::new(ERR_SYNTAX, message).with_source_type(source_type)
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = Some(source_type);
        self
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn export_missing(module: &str, name: &str) -> Self {
        Self::in_module(
            ERR_EXPORT_MISSING,
            module,
            format!("Missing export name '{}' in ES module: {}", name, module),
        )
    }

    pub fn export_star_conflict(module: &str, name: &str) -> Self {
        Self::in_module(
            ERR_EXPORT_STAR_CONFLICT,
            module,
            format!(
                "Conflicting indirect export name '{}' in ES module: {}",
                name, module
            ),
        )
    }

    pub fn export_cycle(module: &str, name: &str) -> Self {
        Self::in_module(
            ERR_EXPORT_CYCLE,
            module,
            format!(
                "Detected cycle while resolving name '{}' in ES module: {}",
                name, module
            ),
        )
    }

    pub fn unknown_module(module: &str) -> Self {
        Self::in_module(
            ERR_UNKNOWN_MODULE,
            module,
            format!("Unknown module: {}", module),
        )
    }

    fn in_module(code: &str, module: &str, message: String) -> Self {
        let mut error = Self::new(code, &message);
        error.module = Some(module.to_string());
        error
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPORT VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Where an exported name finally comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExport {
    pub module: ModuleId,
    /// Local name in `module`, `*` for a namespace object.
    pub name: String,
}

/// Link-time validation of one module against its resolved children.
///
/// Merges star re-exports, checks every name the module imports from an
/// ES child, and arms the deferred TDZ pass when the module reaches itself
/// through its own dependencies.
pub fn validate(graph: &mut ModuleGraph, id: &str) -> Result<(), CompilerError> {
    if !graph.contains(id) {
        return Err(CompilerError::unknown_module(id));
    }

    resolve_exported_stars(graph, id, &mut HashSet::new());
    validate_dependencies(graph, id)?;

    if graph.is_descendant(id, id) {
        if let Some(compiled) = graph.get(id).and_then(|entry| entry.compiled.clone()) {
            tracing::debug!(module = id, "cycle detected, enforcing TDZ");
            compiled.enforce_tdz()?;
        }
    }

    Ok(())
}

/// Merge `export * from` names from ES children into the module's working
/// export table. A name reachable through two different star specifiers is
/// marked conflicted unless the module exports it explicitly; `default` is
/// never star-exported.
pub fn resolve_exported_stars(graph: &mut ModuleGraph, id: &str, in_progress: &mut HashSet<ModuleId>) {
    let Some(entry) = graph.get(id) else {
        return;
    };
    if entry.stars_resolved || entry.kind != ModuleKind::Esm || !in_progress.insert(id.to_string()) {
        return;
    }

    let children: Vec<ModuleId> = entry.children.values().cloned().collect();
    let stars: Vec<(String, ModuleId)> = entry
        .compiled
        .as_ref()
        .map(|compiled| {
            compiled
                .exported_stars
                .iter()
                .filter_map(|specifier| {
                    entry
                        .children
                        .get(specifier)
                        .map(|child| (specifier.clone(), child.clone()))
                })
                .collect()
        })
        .unwrap_or_default();

    for child in &children {
        resolve_exported_stars(graph, child, in_progress);
    }

    // Only names merged from another star target can conflict; explicit
    // exports and re-exports shadow star names.
    let mut from_stars: HashSet<String> = HashSet::new();

    for (specifier, child) in stars {
        let names: Vec<String> = match graph.get(&child) {
            Some(child_entry) if child_entry.kind == ModuleKind::Esm => {
                child_entry.exported_specifiers.keys().cloned().collect()
            }
            _ => continue,
        };

        let Some(entry) = graph.get_mut(id) else {
            return;
        };

        for name in names {
            if name == "default" {
                continue;
            }

            match entry.exported_specifiers.get(&name) {
                None => {
                    from_stars.insert(name.clone());
                    entry.exported_specifiers.insert(
                        name.clone(),
                        ExportedSpecifier::Reexport {
                            local: name,
                            specifier: specifier.clone(),
                        },
                    );
                }
                Some(ExportedSpecifier::Reexport {
                    specifier: existing,
                    ..
                }) if *existing != specifier && from_stars.contains(&name) => {
                    tracing::trace!(module = id, name = %name, "conflicting star export");
                    entry
                        .exported_specifiers
                        .insert(name, ExportedSpecifier::Conflicted);
                }
                Some(_) => {}
            }
        }
    }

    if let Some(entry) = graph.get_mut(id) {
        entry.stars_resolved = true;
    }
}

fn validate_dependencies(graph: &ModuleGraph, id: &str) -> Result<(), CompilerError> {
    let Some(entry) = graph.get(id) else {
        return Err(CompilerError::unknown_module(id));
    };
    let Some(compiled) = entry.compiled.as_ref() else {
        return Ok(());
    };

    for (specifier, dependency) in &compiled.dependency_specifiers {
        // Unlinked specifiers are the loader's concern.
        let Some(child_id) = entry.children.get(specifier) else {
            continue;
        };
        let Some(child) = graph.get(child_id) else {
            return Err(CompilerError::unknown_module(child_id));
        };

        match child.kind {
            ModuleKind::Esm => {
                for name in &dependency.exported_names {
                    resolve_exported_name(graph, child_id, name, &mut HashSet::new())?;
                }
            }
            ModuleKind::CommonJs => {
                if !graph.cjs_named_exports {
                    if let Some(name) = dependency.exported_names.iter().find(|n| *n != "default") {
                        return Err(CompilerError::export_missing(child_id, name));
                    }
                }
            }
            ModuleKind::Builtin => {}
        }
    }

    Ok(())
}

/// Follow `name` through re-exports starting at module `id`.
///
/// Returns `Ok(None)` when the name lands in a non-ES module, where it can
/// only be checked at runtime.
pub fn resolve_exported_name(
    graph: &ModuleGraph,
    id: &str,
    name: &str,
    seen: &mut HashSet<ModuleId>,
) -> Result<Option<ResolvedExport>, CompilerError> {
    let Some(entry) = graph.get(id) else {
        return Err(CompilerError::unknown_module(id));
    };
    if entry.kind != ModuleKind::Esm {
        return Ok(None);
    }

    let exported_stars: &[String] = entry
        .compiled
        .as_ref()
        .map_or(&[], |compiled| compiled.exported_stars.as_slice());

    if seen.contains(id) {
        return match entry.exported_specifiers.get(name) {
            Some(ExportedSpecifier::Reexport { specifier, .. })
                if exported_stars.contains(specifier) =>
            {
                Err(CompilerError::export_missing(id, name))
            }
            _ => Err(CompilerError::export_cycle(id, name)),
        };
    }

    match entry.exported_specifiers.get(name) {
        Some(ExportedSpecifier::Local) => Ok(Some(ResolvedExport {
            module: id.to_string(),
            name: name.to_string(),
        })),
        Some(ExportedSpecifier::Conflicted) => Err(CompilerError::export_star_conflict(id, name)),
        Some(ExportedSpecifier::Reexport { local, specifier }) => {
            let Some(child) = entry.children.get(specifier) else {
                return Ok(None);
            };
            if local == "*" {
                return Ok(Some(ResolvedExport {
                    module: child.clone(),
                    name: local.clone(),
                }));
            }
            seen.insert(id.to_string());
            let child = child.clone();
            resolve_exported_name(graph, &child, local, seen)
        }
        None => {
            let all_stars_esm = exported_stars.iter().all(|specifier| {
                entry
                    .children
                    .get(specifier)
                    .and_then(|child| graph.get(child))
                    .is_some_and(|child| child.kind == ModuleKind::Esm)
            });

            if all_stars_esm {
                Err(CompilerError::export_missing(id, name))
            } else {
                Ok(None)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
