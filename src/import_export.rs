//! Rewrites import and export syntax into runtime calls.
//!
//! Import statements become `_.w(...)` watch registrations, local exports
//! become `_.x(...)` getter registrations, and both are hoisted to the top
//! of the program once the walk is finished. Along the way the visitor
//! records the module's dependency and export metadata.

use indexmap::{IndexMap, IndexSet};
use oxc_ast::ast::{
    Declaration, ExportAllDeclaration, ExportDefaultDeclaration, ExportDefaultDeclarationKind,
    ExportNamedDeclaration, ImportDeclaration, ImportDeclarationSpecifier, ImportExpression,
    MetaProperty, ModuleExportName,
};
use oxc_span::{GetSpan, Span};

use crate::compiler::{DependencySpecifier, ExportedSpecifier};
use crate::magic_string::MagicString;
use crate::parse::{line_column, skip_trivia, TopLevel};
use crate::path::NodePath;
use crate::runtime::{Runtime, Setter, DEFAULT_VALUE, DYNAMIC_IMPORT, IMPORT_META};
use crate::scope::collect_binding_pattern;
use crate::validate::{CompilerError, ERR_IMPORT_META_OUTSIDE_MODULE, ERR_INVALID_META_PROPERTY};
use crate::visitor::ModuleVisitor;

/// A local name bound by an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub specifier: String,
    /// Exported name in the dependency, `*` for a namespace import.
    pub imported: String,
}

/// Everything the import/export pass learned about the module.
#[derive(Debug, Default)]
pub struct ModuleRecord {
    pub added_import_export: bool,
    pub added_import_meta: bool,
    pub added_dynamic_import: bool,
    pub dependency_specifiers: IndexMap<String, DependencySpecifier>,
    pub exported_names: IndexSet<String>,
    pub exported_specifiers: IndexMap<String, ExportedSpecifier>,
    pub exported_stars: Vec<String>,
    pub imported_locals: IndexMap<String, ImportBinding>,
    /// `(exported, local)` pairs registered through `_.x`.
    pub local_exports: Vec<(String, String)>,
    hoisted_imports: String,
}

impl ModuleRecord {
    pub fn changed(&self) -> bool {
        self.added_import_export || self.added_import_meta || self.added_dynamic_import
    }

    /// Imported locals that must not be read before their exporter runs.
    pub fn temporals(&self) -> IndexSet<String> {
        self.imported_locals.keys().cloned().collect()
    }

    /// Exported local declarations whose writes must reach importers.
    pub fn assignable_exports(&self) -> IndexSet<String> {
        self.local_exports
            .iter()
            .filter(|(_, local)| !self.imported_locals.contains_key(local))
            .map(|(_, local)| local.clone())
            .collect()
    }

    /// Resolve exports of imported bindings into re-exports and insert the
    /// hoisted declarations, export getters and watch calls after the
    /// directive prologue.
    pub fn finalize_hoisting(&mut self, magic: &mut MagicString, top: &TopLevel, runtime: &Runtime, var: bool) {
        for (exported, local) in &self.local_exports {
            if let Some(binding) = self.imported_locals.get(local) {
                self.exported_specifiers.insert(
                    exported.clone(),
                    ExportedSpecifier::Reexport {
                        local: binding.imported.clone(),
                        specifier: binding.specifier.clone(),
                    },
                );
            }
        }

        let mut code = String::new();

        if !self.imported_locals.is_empty() {
            let names: Vec<&str> = self.imported_locals.keys().map(String::as_str).collect();
            code.push_str(if var { "var " } else { "let " });
            code.push_str(&names.join(","));
            code.push(';');
        }
        if !self.local_exports.is_empty() {
            code.push_str(&runtime.export(&self.local_exports));
        }
        code.push_str(&self.hoisted_imports);

        if code.is_empty() {
            return;
        }
        if top.has_directives {
            code.insert(0, ';');
        }

        tracing::trace!(index = top.insert_index, "hoisting import/export bindings");
        magic.prepend_left(top.insert_index, &code);
    }
}

pub struct ImportExportVisitor<'m, 'r> {
    magic: &'m mut MagicString,
    runtime: &'r Runtime,
    module: bool,
    record: ModuleRecord,
    error: Option<CompilerError>,
}

impl<'m, 'r> ImportExportVisitor<'m, 'r> {
    pub fn new(magic: &'m mut MagicString, runtime: &'r Runtime, module: bool) -> Self {
        Self {
            magic,
            runtime,
            module,
            record: ModuleRecord::default(),
            error: None,
        }
    }

    pub fn finish(self) -> Result<ModuleRecord, CompilerError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.record),
        }
    }

    fn add_dependency(&mut self, specifier: &str) -> &mut DependencySpecifier {
        self.record
            .dependency_specifiers
            .entry(specifier.to_string())
            .or_default()
    }

    fn request_name(&mut self, specifier: &str, name: &str) {
        let dependency = self.add_dependency(specifier);
        if !dependency.exported_names.iter().any(|n| n == name) {
            dependency.exported_names.push(name.to_string());
        }
    }

    fn add_local_export(&mut self, exported: &str, local: &str) {
        self.record.exported_names.insert(exported.to_string());
        self.record
            .exported_specifiers
            .insert(exported.to_string(), ExportedSpecifier::Local);
        self.record
            .local_exports
            .push((exported.to_string(), local.to_string()));
    }

    fn remove_statement(&mut self, span: Span) {
        self.magic.overwrite_padded(span.start, span.end, "");
    }

    fn fail(&mut self, error: CompilerError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

pub(crate) fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

/// Offset right after the `default` keyword of an export default statement.
fn default_keyword_end(source: &str, decl_start: u32, body_start: u32) -> u32 {
    let region = &source[decl_start as usize..body_start as usize];
    let keyword = skip_trivia(region, "export".len());
    if region[keyword..].starts_with("default") {
        decl_start + (keyword + "default".len()) as u32
    } else {
        body_start
    }
}

impl<'a, 'm, 'r> ModuleVisitor<'a> for ImportExportVisitor<'m, 'r> {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        let specifier = decl.source.value.to_string();
        self.add_dependency(&specifier);

        let mut setters = Vec::new();

        for spec in decl.specifiers.iter().flatten() {
            let (imported, local) = match spec {
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    (export_name(&s.imported), s.local.name.to_string())
                }
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    ("default".to_string(), s.local.name.to_string())
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                    ("*".to_string(), s.local.name.to_string())
                }
            };

            if imported != "*" {
                self.request_name(&specifier, &imported);
            }
            self.record.imported_locals.insert(
                local.clone(),
                ImportBinding {
                    specifier: specifier.clone(),
                    imported: imported.clone(),
                },
            );
            setters.push(Setter::Local { imported, local });
        }

        let watch = self.runtime.watch(&specifier, &setters);
        self.record.hoisted_imports.push_str(&watch);
        self.record.added_import_export = true;
        self.remove_statement(decl.span);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        let specifier = decl.source.value.to_string();
        self.add_dependency(&specifier);

        let setter = match &decl.exported {
            Some(exported) => {
                let exported = export_name(exported);
                self.record.exported_names.insert(exported.clone());
                self.record.exported_specifiers.insert(
                    exported.clone(),
                    ExportedSpecifier::Reexport {
                        local: "*".to_string(),
                        specifier: specifier.clone(),
                    },
                );
                Setter::Reexport {
                    imported: "*".to_string(),
                    exported,
                }
            }
            None => {
                if !self.record.exported_stars.contains(&specifier) {
                    self.record.exported_stars.push(specifier.clone());
                }
                Setter::Star
            }
        };

        let watch = self.runtime.watch(&specifier, &[setter]);
        self.record.hoisted_imports.push_str(&watch);
        self.record.added_import_export = true;
        self.remove_statement(decl.span);
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        self.record.added_import_export = true;

        if let Some(source) = &decl.source {
            let specifier = source.value.to_string();
            self.add_dependency(&specifier);

            let mut setters = Vec::new();
            for spec in &decl.specifiers {
                let local = export_name(&spec.local);
                let exported = export_name(&spec.exported);
                self.request_name(&specifier, &local);
                self.record.exported_names.insert(exported.clone());
                self.record.exported_specifiers.insert(
                    exported.clone(),
                    ExportedSpecifier::Reexport {
                        local: local.clone(),
                        specifier: specifier.clone(),
                    },
                );
                setters.push(Setter::Reexport {
                    imported: local,
                    exported,
                });
            }

            let watch = self.runtime.watch(&specifier, &setters);
            self.record.hoisted_imports.push_str(&watch);
            self.remove_statement(decl.span);
            return;
        }

        let Some(declaration) = &decl.declaration else {
            for spec in &decl.specifiers {
                let local = export_name(&spec.local);
                let exported = export_name(&spec.exported);
                self.add_local_export(&exported, &local);
            }
            self.remove_statement(decl.span);
            return;
        };

        let mut names = Vec::new();
        match declaration {
            Declaration::VariableDeclaration(var) => {
                for declarator in &var.declarations {
                    collect_binding_pattern(&declarator.id, &mut names);
                }
            }
            Declaration::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    names.push(id.name.to_string());
                }
            }
            Declaration::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    names.push(id.name.to_string());
                }
            }
            _ => {}
        }

        for name in &names {
            self.add_local_export(name, name);
        }
        self.magic
            .overwrite_padded(decl.span.start, declaration.span().start, "");
    }

    fn visit_export_default_declaration(&mut self, decl: &ExportDefaultDeclaration<'a>) {
        self.record.added_import_export = true;
        self.record.exported_names.insert("default".to_string());
        self.record
            .exported_specifiers
            .insert("default".to_string(), ExportedSpecifier::Local);

        let named = match &decl.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                func.id.as_ref().map(|id| (id.name.to_string(), func.span))
            }
            ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                class.id.as_ref().map(|id| (id.name.to_string(), class.span))
            }
            _ => None,
        };

        if let Some((name, body)) = named {
            self.record
                .local_exports
                .push(("default".to_string(), name));
            self.magic.overwrite_padded(decl.span.start, body.start, "");
            return;
        }

        let body = decl.declaration.span();
        let open = self.runtime.member(DEFAULT_VALUE) + "(";
        let keyword_end = default_keyword_end(self.magic.original(), decl.span.start, body.start);
        let gap = &self.magic.original()[keyword_end as usize..body.start as usize];
        // A parenthesized body keeps its own parens.
        let parenthesized = gap[skip_trivia(gap, 0)..].starts_with('(');
        let replace_end = if parenthesized { keyword_end } else { body.start };

        self.magic.overwrite_padded(decl.span.start, replace_end, &open);

        let is_declaration = decl.declaration.as_expression().is_none();
        self.magic
            .prepend_left(body.end, if is_declaration { ");" } else { ")" });
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>, _path: &NodePath) {
        let start = expr.span.start;
        let rest = &self.magic.original()[start as usize..expr.span.end as usize];
        let is_call = rest
            .strip_prefix("import")
            .is_some_and(|after| after.trim_start().starts_with('('));
        if !is_call {
            return;
        }

        let callee = self.runtime.member(DYNAMIC_IMPORT);
        self.magic.overwrite(start, start + 6, &callee);
        self.record.added_dynamic_import = true;
    }

    fn visit_meta_property(&mut self, prop: &MetaProperty<'a>, _path: &NodePath) {
        if prop.meta.name != "import" {
            return;
        }

        if prop.property.name != "meta" {
            let location = line_column(self.magic.original(), prop.property.span.start);
            self.fail(
                CompilerError::new(
                    ERR_INVALID_META_PROPERTY,
                    &format!(
                        "The only valid meta property for import is 'import.meta', got 'import.{}'",
                        prop.property.name
                    ),
                )
                .at(location),
            );
            return;
        }

        if !self.module {
            let location = line_column(self.magic.original(), prop.meta.span.start);
            self.fail(
                CompilerError::new(
                    ERR_IMPORT_META_OUTSIDE_MODULE,
                    "Cannot use 'import.meta' outside a module",
                )
                .at(location),
            );
            return;
        }

        let meta = self.runtime.member(IMPORT_META);
        self.magic.overwrite(prop.span.start, prop.span.end, &meta);
        self.record.added_import_meta = true;
    }
}
