//! Compile Module for the ESM compiler
//!
//! `compile` turns one source text into a [`CompileResult`]: rewritten code
//! plus the dependency and export metadata a loader needs to link it.

use indexmap::{IndexMap, IndexSet};
use oxc_allocator::Allocator;
use parking_lot::Mutex;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;

use crate::arguments::{ArgumentsVisitor, CompileWarning, CJS_VARS};
use crate::assignment::AssignmentVisitor;
use crate::console::ConsoleVisitor;
use crate::eval::EvalVisitor;
use crate::import_export::ImportExportVisitor;
use crate::magic_string::MagicString;
use crate::options::{CompileOptions, SourceType};
use crate::parse::{find_indexes, has_pragma, parse, strip_shebang, ParseConfig, ParsedModule};
use crate::runtime::{Runtime, MAIN_MARKER};
use crate::scope::ScopeResolver;
use crate::temporal::TemporalPass;
use crate::validate::CompilerError;
use crate::visitor::{traverse, PossibleIndexes};

// ═══════════════════════════════════════════════════════════════════════════════
// RESULT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DependencySpecifier {
    /// Names this module imports from the dependency, in first-use order.
    pub exported_names: Vec<String>,
}

/// Origin of an exported name.
///
/// Serialized as `true`, `{ "local": .., "specifier": .. }` or `false`, the
/// shape loaders already consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportedSpecifier {
    Local,
    Reexport { local: String, specifier: String },
    /// Reachable through more than one `export *` with different origins.
    Conflicted,
}

impl Serialize for ExportedSpecifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExportedSpecifier::Local => serializer.serialize_bool(true),
            ExportedSpecifier::Conflicted => serializer.serialize_bool(false),
            ExportedSpecifier::Reexport { local, specifier } => {
                let mut state = serializer.serialize_struct("Reexport", 2)?;
                state.serialize_field("local", local)?;
                state.serialize_field("specifier", specifier)?;
                state.end()
            }
        }
    }
}

/// Text state that may still change after `compile` returns.
struct Output {
    source: Arc<str>,
    magic: Option<MagicString>,
    deferred: Option<TemporalPass>,
    code: Option<Arc<str>>,
}

pub struct CompileResult {
    pub changed: bool,
    pub source_type: SourceType,
    pub dependency_specifiers: IndexMap<String, DependencySpecifier>,
    pub exported_names: IndexSet<String>,
    pub exported_specifiers: IndexMap<String, ExportedSpecifier>,
    pub exported_stars: Vec<String>,
    pub top_level_return: bool,
    pub warnings: Option<Vec<CompileWarning>>,
    output: Mutex<Output>,
}

impl std::fmt::Debug for CompileResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileResult")
            .field("changed", &self.changed)
            .field("source_type", &self.source_type)
            .field("dependency_specifiers", &self.dependency_specifiers)
            .field("exported_names", &self.exported_names)
            .field("exported_stars", &self.exported_stars)
            .field("top_level_return", &self.top_level_return)
            .finish_non_exhaustive()
    }
}

impl CompileResult {
    fn unchanged(source: &str, source_type: SourceType) -> Self {
        CompileResult {
            changed: false,
            source_type,
            dependency_specifiers: IndexMap::new(),
            exported_names: IndexSet::new(),
            exported_specifiers: IndexMap::new(),
            exported_stars: Vec::new(),
            top_level_return: false,
            warnings: None,
            output: Mutex::new(Output {
                source: Arc::from(source),
                magic: None,
                deferred: None,
                code: None,
            }),
        }
    }

    /// The compiled text. Rendered on first access and memoized; changed
    /// output is prefixed with the `"main";` marker.
    pub fn code(&self) -> Arc<str> {
        let mut output = self.output.lock();
        if let Some(code) = &output.code {
            return code.clone();
        }

        let code: Arc<str> = match &output.magic {
            Some(magic) if self.changed => Arc::from(format!("{}{}", MAIN_MARKER, magic)),
            _ => output.source.clone(),
        };
        output.code = Some(code.clone());
        code
    }

    pub fn has_pending_tdz(&self) -> bool {
        self.output.lock().deferred.is_some()
    }

    /// Apply the deferred TDZ rewrite. Only the first call does any work.
    pub fn enforce_tdz(&self) -> Result<(), CompilerError> {
        let mut output = self.output.lock();
        let Some(pass) = output.deferred.take() else {
            return Ok(());
        };
        let Some(magic) = output.magic.as_mut() else {
            return Ok(());
        };

        pass.run(magic)?;
        output.code = None;
        Ok(())
    }
}

impl Serialize for CompileResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CompileResult", 9)?;
        state.serialize_field("code", &*self.code())?;
        state.serialize_field("changed", &self.changed)?;
        state.serialize_field("sourceType", &self.source_type)?;
        state.serialize_field("dependencySpecifiers", &self.dependency_specifiers)?;
        state.serialize_field("exportedNames", &self.exported_names)?;
        state.serialize_field("exportedSpecifiers", &self.exported_specifiers)?;
        state.serialize_field("exportedStars", &self.exported_stars)?;
        state.serialize_field("topLevelReturn", &self.top_level_return)?;
        state.serialize_field("warnings", &self.warnings)?;
        state.end()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILE
// ═══════════════════════════════════════════════════════════════════════════════

fn resolve_source_type(code: &str, options: &CompileOptions) -> SourceType {
    if options.source_type != SourceType::Unambiguous || !options.pragmas {
        return options.source_type;
    }
    if options.hint == SourceType::Module || has_pragma(code, "use module") {
        return SourceType::Module;
    }
    if has_pragma(code, "use script") {
        return SourceType::Script;
    }
    SourceType::Unambiguous
}

fn parse_with_retry<'a>(
    allocator: &'a Allocator,
    code: &'a str,
    source_type: SourceType,
    options: &CompileOptions,
) -> Result<(ParsedModule<'a>, ParseConfig), CompilerError> {
    let config = ParseConfig {
        module: source_type != SourceType::Script,
        allow_return_outside_function: source_type == SourceType::Script
            || options.cjs.top_level_return,
        strict: options.strict == Some(true),
    };

    match parse(allocator, code, config) {
        Ok(parsed) => Ok((parsed, config)),
        Err(error) if source_type == SourceType::Unambiguous => {
            tracing::debug!(error = %error, "module parse failed, retrying as script");
            let script = ParseConfig {
                module: false,
                allow_return_outside_function: true,
                strict: config.strict,
            };
            match parse(allocator, code, script) {
                Ok(parsed) => Ok((parsed, script)),
                Err(_) => Err(error),
            }
        }
        Err(error) => Err(error),
    }
}

pub fn compile(code: &str, options: &CompileOptions) -> Result<CompileResult, CompilerError> {
    options.check()?;

    let (code, had_shebang) = strip_shebang(code);
    let mut source_type = resolve_source_type(code, options);

    let console_indexes = find_indexes(code, &["console"]);
    let eval_indexes = find_indexes(code, &["eval"]);
    let import_export_indexes = find_indexes(code, &["import", "export"]);

    if source_type != SourceType::Module
        && console_indexes.is_empty()
        && eval_indexes.is_empty()
        && import_export_indexes.is_empty()
    {
        tracing::trace!(shebang = had_shebang, "no candidate tokens, skipping parse");
        let final_type = if source_type == SourceType::Unambiguous {
            SourceType::Script
        } else {
            source_type
        };
        return Ok(CompileResult::unchanged(code, final_type));
    }

    let allocator = Allocator::default();
    let (parsed, config) = parse_with_retry(&allocator, code, source_type, options)?;
    if !config.module {
        source_type = SourceType::Script;
    }

    let runtime = Runtime::new(&options.runtime_name);
    let resolver = ScopeResolver::new(&parsed.scoping);
    let mut magic = MagicString::new(code);

    let mut visitor = ImportExportVisitor::new(&mut magic, &runtime, config.module);
    traverse(&mut visitor, parsed.program, &PossibleIndexes::new(import_export_indexes));
    let mut record = visitor
        .finish()
        .map_err(|error| error.with_source_type(config.source_type()))?;

    if record.added_import_export || record.added_import_meta {
        source_type = SourceType::Module;
    }

    // Strictness follows the grammar the code was parsed with.
    let strict = config.module || config.strict || parsed.top.has_use_strict;

    let mut console_changed = false;
    if !console_indexes.is_empty() && !parsed.top.identifiers.contains("console") {
        let mut visitor = ConsoleVisitor::new(&mut magic, &runtime, &resolver);
        traverse(&mut visitor, parsed.program, &PossibleIndexes::new(console_indexes));
        console_changed = visitor.changed;
    }

    let mut eval_changed = false;
    if !eval_indexes.is_empty() && !parsed.top.identifiers.contains("eval") {
        let mut visitor = EvalVisitor::new(
            &mut magic,
            &runtime,
            &resolver,
            strict,
            record.added_import_export,
        );
        traverse(&mut visitor, parsed.program, &PossibleIndexes::new(eval_indexes));
        eval_changed = visitor.changed;
    }

    if record.added_import_export {
        let mut names = record.temporals();
        names.extend(record.assignable_exports());
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let indexes = find_indexes(code, &name_refs);

        if !indexes.is_empty() {
            let mut visitor = AssignmentVisitor::new(&mut magic, &runtime, &resolver, &names);
            traverse(&mut visitor, parsed.program, &PossibleIndexes::new(indexes));
        }

        record.finalize_hoisting(&mut magic, &parsed.top, &runtime, options.var);
    }

    let mut arguments_changed = false;
    let mut warnings = None;
    let mut deferred = None;

    if source_type == SourceType::Unambiguous {
        source_type = SourceType::Script;
    }

    if source_type == SourceType::Module {
        if record.added_import_export {
            deferred = Some(TemporalPass {
                source: Arc::from(code),
                config,
                runtime: runtime.clone(),
                temporals: record.temporals(),
            });
        }

        if !options.cjs.vars {
            let indexes = find_indexes(code, CJS_VARS);
            if !indexes.is_empty() {
                let mut visitor =
                    ArgumentsVisitor::new(&mut magic, &runtime, &resolver, options.warnings);
                traverse(&mut visitor, parsed.program, &PossibleIndexes::new(indexes));
                arguments_changed = visitor.changed;
                if options.warnings {
                    warnings = Some(visitor.warnings);
                }
            }
        }
    }

    let changed = console_changed || eval_changed || record.changed() || arguments_changed;

    tracing::debug!(
        source_type = %source_type,
        changed,
        dependencies = record.dependency_specifiers.len(),
        "compiled"
    );

    let mut result = CompileResult::unchanged(code, source_type);
    result.changed = changed;
    result.top_level_return = parsed.top.return_outside_function;
    result.warnings = warnings;

    if source_type == SourceType::Module {
        result.dependency_specifiers = record.dependency_specifiers;
        result.exported_names = record.exported_names;
        result.exported_specifiers = record.exported_specifiers;
        result.exported_stars = record.exported_stars;
    }

    if changed {
        let output = result.output.get_mut();
        output.magic = Some(magic);
        output.deferred = deferred;
    }

    Ok(result)
}
