use indexmap::IndexSet;
use oxc_ast::ast::{AssignmentExpression, IdentifierReference, SimpleAssignmentTarget, UpdateExpression};
use oxc_span::Span;

use crate::magic_string::MagicString;
use crate::path::NodePath;
use crate::runtime::{Runtime, UPDATE};
use crate::scope::{AssignmentTargetNames, ScopeResolver};
use crate::visitor::ModuleVisitor;

/// Wraps writes to imported or exported top-level bindings in `_.u(...)` so
/// the runtime can push the new values to importers.
pub struct AssignmentVisitor<'m, 'r, 's, 'n> {
    magic: &'m mut MagicString,
    runtime: &'r Runtime,
    resolver: &'s ScopeResolver<'s>,
    names: &'n IndexSet<String>,
    pub changed: bool,
}

impl<'m, 'r, 's, 'n> AssignmentVisitor<'m, 'r, 's, 'n> {
    pub fn new(
        magic: &'m mut MagicString,
        runtime: &'r Runtime,
        resolver: &'s ScopeResolver<'s>,
        names: &'n IndexSet<String>,
    ) -> Self {
        Self {
            magic,
            runtime,
            resolver,
            names,
            changed: false,
        }
    }

    fn is_tracked(&self, ident: &IdentifierReference) -> bool {
        self.names.contains(ident.name.as_str()) && self.resolver.is_top_level(ident)
    }

    fn wrap(&mut self, span: Span) {
        let open = format!("{}(", self.runtime.member(UPDATE));
        self.magic
            .prepend_left(span.start, &open)
            .prepend_left(span.end, ")");
        self.changed = true;
    }
}

impl<'a, 'm, 'r, 's, 'n> ModuleVisitor<'a> for AssignmentVisitor<'m, 'r, 's, 'n> {
    fn visit_assignment_expression(&mut self, expr: &AssignmentExpression<'a>, _path: &NodePath) {
        let tracked = AssignmentTargetNames::collect(&expr.left)
            .into_iter()
            .any(|ident| self.is_tracked(ident));
        if tracked {
            self.wrap(expr.span);
        }
    }

    fn visit_update_expression(&mut self, expr: &UpdateExpression<'a>, _path: &NodePath) {
        if let SimpleAssignmentTarget::AssignmentTargetIdentifier(ident) = &expr.argument {
            if self.is_tracked(ident) {
                self.wrap(expr.span);
            }
        }
    }
}
