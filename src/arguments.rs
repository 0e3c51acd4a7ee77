//! Module code has no CommonJS wrapper, so the free variables a CommonJS
//! function would receive are routed through the runtime instead.

use oxc_ast::ast::IdentifierReference;
use serde::{Deserialize, Serialize};

use crate::magic_string::MagicString;
use crate::parse::line_column;
use crate::path::NodePath;
use crate::runtime::Runtime;
use crate::scope::ScopeResolver;
use crate::visitor::ModuleVisitor;

pub const CJS_VARS: &[&str] = &[
    "arguments",
    "__dirname",
    "__filename",
    "exports",
    "module",
    "require",
];

pub const WRN_ARGUMENTS_ACCESS: &str = "WRN_ARGUMENTS_ACCESS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompileWarning {
    pub code: String,
    pub name: String,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

pub struct ArgumentsVisitor<'m, 'r, 's> {
    magic: &'m mut MagicString,
    runtime: &'r Runtime,
    resolver: &'s ScopeResolver<'s>,
    collect_warnings: bool,
    pub warnings: Vec<CompileWarning>,
    pub changed: bool,
}

impl<'m, 'r, 's> ArgumentsVisitor<'m, 'r, 's> {
    pub fn new(
        magic: &'m mut MagicString,
        runtime: &'r Runtime,
        resolver: &'s ScopeResolver<'s>,
        collect_warnings: bool,
    ) -> Self {
        Self {
            magic,
            runtime,
            resolver,
            collect_warnings,
            warnings: Vec::new(),
            changed: false,
        }
    }

    fn warn(&mut self, ident: &IdentifierReference) {
        if !self.collect_warnings {
            return;
        }
        let location = line_column(self.magic.original(), ident.span.start);
        self.warnings.push(CompileWarning {
            code: WRN_ARGUMENTS_ACCESS.to_string(),
            name: ident.name.to_string(),
            message: format!("'{}' is not defined in ES modules", ident.name),
            line: location.line,
            column: location.column,
        });
    }
}

impl<'a, 'm, 'r, 's> ModuleVisitor<'a> for ArgumentsVisitor<'m, 'r, 's> {
    fn visit_identifier(&mut self, ident: &IdentifierReference<'a>, path: &NodePath) {
        let name = ident.name.as_str();
        if !CJS_VARS.contains(&name) || path.in_with_body() || !self.resolver.is_free(ident) {
            return;
        }
        // Plain functions bring their own `arguments`.
        if name == "arguments" && path.in_plain_function() {
            return;
        }

        let span = ident.span;

        if path.is_typeof_operand(span) {
            if name == "arguments" {
                let void = format!("void {}", self.runtime.name());
                self.magic.overwrite(span.start, span.end, &void);
                self.changed = true;
                self.warn(ident);
            }
            return;
        }
        if path.is_write_target() {
            return;
        }

        let access = self.runtime.cjs_var(name);
        if path.is_shorthand_value(span) {
            self.magic.prepend_left(span.end, &format!(":{}", access));
        } else if path.needs_new_parens(span) {
            self.magic.overwrite(span.start, span.end, &format!("({})", access));
        } else {
            self.magic.overwrite(span.start, span.end, &access);
        }

        self.changed = true;
        self.warn(ident);
    }
}
