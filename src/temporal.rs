//! Temporal dead zone enforcement for imported bindings.
//!
//! This pass only runs when a module turns out to be part of a dependency
//! cycle, where an import may be read before its exporter has run. It is
//! applied to an already-rewritten result, so it re-parses the stored
//! source instead of holding on to the first parse's arena.

use indexmap::IndexSet;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Declaration, ExportDefaultDeclaration, ExportNamedDeclaration, IdentifierReference,
};
use oxc_span::GetSpan;
use std::sync::Arc;

use crate::import_export::export_name;
use crate::magic_string::MagicString;
use crate::parse::{find_indexes, parse, ParseConfig};
use crate::path::NodePath;
use crate::runtime::Runtime;
use crate::scope::{collect_binding_pattern, ScopeResolver};
use crate::validate::CompilerError;
use crate::visitor::{traverse, ModuleVisitor, PossibleIndexes};

pub struct TemporalVisitor<'m, 'r, 's, 't> {
    magic: &'m mut MagicString,
    runtime: &'r Runtime,
    resolver: &'s ScopeResolver<'s>,
    temporals: &'t IndexSet<String>,
}

impl<'m, 'r, 's, 't> TemporalVisitor<'m, 'r, 's, 't> {
    pub fn new(
        magic: &'m mut MagicString,
        runtime: &'r Runtime,
        resolver: &'s ScopeResolver<'s>,
        temporals: &'t IndexSet<String>,
    ) -> Self {
        Self {
            magic,
            runtime,
            resolver,
            temporals,
        }
    }

    fn annotate(&mut self, end: u32, names: &[String]) {
        if !names.is_empty() {
            self.magic
                .prepend_right(end, &self.runtime.init_bindings(names));
        }
    }
}

impl<'a, 'm, 'r, 's, 't> ModuleVisitor<'a> for TemporalVisitor<'m, 'r, 's, 't> {
    fn visit_identifier(&mut self, ident: &IdentifierReference<'a>, path: &NodePath) {
        let name = ident.name.as_str();
        if !self.temporals.contains(name) || path.is_write_target() || !self.resolver.is_top_level(ident) {
            return;
        }

        let span = ident.span;

        if path.is_shorthand_value(span) {
            let assertion = format!(":{}", self.runtime.assert_tdz(name));
            self.magic.prepend_left(span.end, &assertion);
            return;
        }

        let parens = path.needs_new_parens(span);
        let open = format!(
            "{}{}",
            if parens { "(" } else { "" },
            self.runtime.assert_tdz_open(name)
        );
        let close = if parens { "))" } else { ")" };

        self.magic
            .prepend_right(span.start, &open)
            .prepend_right(span.end, close);
    }

    fn visit_export_default_declaration(&mut self, decl: &ExportDefaultDeclaration<'a>) {
        self.annotate(decl.span.end, &["default".to_string()]);
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        let mut names = Vec::new();

        match &decl.declaration {
            Some(Declaration::VariableDeclaration(var)) => {
                for declarator in &var.declarations {
                    collect_binding_pattern(&declarator.id, &mut names);
                }
            }
            Some(Declaration::ClassDeclaration(class)) => {
                if let Some(id) = &class.id {
                    names.push(id.name.to_string());
                }
            }
            // Function declarations are initialized when the module is
            // instantiated.
            Some(_) => {}
            None if decl.source.is_none() => {
                for spec in &decl.specifiers {
                    names.push(export_name(&spec.local));
                }
            }
            None => {}
        }

        let end = decl
            .declaration
            .as_ref()
            .map_or(decl.span.end, |declaration| declaration.span().end);
        self.annotate(end, &names);
    }
}

/// The deferred TDZ rewrite, kept on a result until it is asked for.
#[derive(Debug, Clone)]
pub struct TemporalPass {
    pub source: Arc<str>,
    pub config: ParseConfig,
    pub runtime: Runtime,
    pub temporals: IndexSet<String>,
}

impl TemporalPass {
    pub fn run(&self, magic: &mut MagicString) -> Result<(), CompilerError> {
        let allocator = Allocator::default();
        let parsed = parse(&allocator, &self.source, self.config)?;
        let resolver = ScopeResolver::new(&parsed.scoping);

        let mut names: Vec<&str> = self.temporals.iter().map(String::as_str).collect();
        names.push("export");
        let indexes = PossibleIndexes::new(find_indexes(&self.source, &names));

        tracing::debug!(temporals = self.temporals.len(), "running TDZ pass");

        let mut visitor = TemporalVisitor::new(magic, &self.runtime, &resolver, &self.temporals);
        traverse(&mut visitor, parsed.program, &indexes);
        Ok(())
    }
}
