//! Binding resolution over oxc's semantic scoping tables.

use oxc_ast::ast::{
    AssignmentTarget, AssignmentTargetMaybeDefault, AssignmentTargetProperty,
    AssignmentTargetPropertyIdentifier, AssignmentTargetWithDefault, BindingPattern,
    IdentifierReference,
};
use oxc_semantic::Scoping;
use std::collections::HashSet;

/// Answers "where does this identifier bind" questions for the visitors.
pub struct ScopeResolver<'s> {
    scoping: &'s Scoping,
}

impl<'s> ScopeResolver<'s> {
    pub fn new(scoping: &'s Scoping) -> Self {
        Self { scoping }
    }

    /// True when no enclosing scope declares the name, so it reads a global.
    /// Identifiers the semantic pass did not register are never free.
    pub fn is_free(&self, ident: &IdentifierReference) -> bool {
        match ident.reference_id.get() {
            Some(reference_id) => self
                .scoping
                .get_reference(reference_id)
                .symbol_id()
                .is_none(),
            None => false,
        }
    }

    /// True when the identifier binds to a declaration in the top-level scope.
    pub fn is_top_level(&self, ident: &IdentifierReference) -> bool {
        let Some(reference_id) = ident.reference_id.get() else {
            return false;
        };
        let Some(symbol_id) = self.scoping.get_reference(reference_id).symbol_id() else {
            return false;
        };
        self.scoping.symbol_scope_id(symbol_id) == self.scoping.root_scope_id()
    }
}

/// Names declared directly in the program's top-level scope.
pub fn top_level_names(scoping: &Scoping) -> HashSet<String> {
    let root = scoping.root_scope_id();
    scoping
        .symbol_ids()
        .filter(|symbol_id| scoping.symbol_scope_id(*symbol_id) == root)
        .map(|symbol_id| scoping.symbol_name(symbol_id).to_string())
        .collect()
}

/// Every name a declaration pattern binds, in source order.
pub fn collect_binding_pattern(pattern: &BindingPattern, names: &mut Vec<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => {
            names.push(id.name.to_string());
        }
        BindingPattern::ObjectPattern(obj) => {
            for prop in &obj.properties {
                collect_binding_pattern(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                collect_binding_pattern(&rest.argument, names);
            }
        }
        BindingPattern::ArrayPattern(arr) => {
            for pattern in arr.elements.iter().flatten() {
                collect_binding_pattern(pattern, names);
            }
            if let Some(rest) = &arr.rest {
                collect_binding_pattern(&rest.argument, names);
            }
        }
        BindingPattern::AssignmentPattern(assign) => {
            collect_binding_pattern(&assign.left, names);
        }
    }
}

/// Collects the identifiers an assignment writes to. Default values,
/// computed keys and member objects are reads and are skipped.
pub struct AssignmentTargetNames<'r, 'a> {
    pub targets: Vec<&'r IdentifierReference<'a>>,
}

impl<'r, 'a> AssignmentTargetNames<'r, 'a> {
    pub fn collect(target: &'r AssignmentTarget<'a>) -> Vec<&'r IdentifierReference<'a>> {
        let mut collector = Self {
            targets: Vec::new(),
        };
        collector.walk_target(target);
        collector.targets
    }

    fn walk_target(&mut self, target: &'r AssignmentTarget<'a>) {
        match target {
            AssignmentTarget::AssignmentTargetIdentifier(ident) => self.targets.push(&**ident),
            AssignmentTarget::ArrayAssignmentTarget(array) => {
                for element in array.elements.iter().flatten() {
                    self.walk_maybe_default(element);
                }
                if let Some(rest) = &array.rest {
                    self.walk_target(&rest.target);
                }
            }
            AssignmentTarget::ObjectAssignmentTarget(object) => {
                for property in &object.properties {
                    match property {
                        AssignmentTargetProperty::AssignmentTargetPropertyIdentifier(p) => {
                            self.walk_property_identifier(p);
                        }
                        AssignmentTargetProperty::AssignmentTargetPropertyProperty(p) => {
                            self.walk_maybe_default(&p.binding);
                        }
                    }
                }
                if let Some(rest) = &object.rest {
                    self.walk_target(&rest.target);
                }
            }
            _ => {}
        }
    }

    fn walk_maybe_default(&mut self, it: &'r AssignmentTargetMaybeDefault<'a>) {
        match it {
            AssignmentTargetMaybeDefault::AssignmentTargetWithDefault(with_default) => {
                self.walk_with_default(with_default);
            }
            other => {
                if let Some(target) = other.as_assignment_target() {
                    self.walk_target(target);
                }
            }
        }
    }

    fn walk_with_default(&mut self, it: &'r AssignmentTargetWithDefault<'a>) {
        self.walk_target(&it.binding);
    }

    fn walk_property_identifier(&mut self, it: &'r AssignmentTargetPropertyIdentifier<'a>) {
        self.targets.push(&it.binding);
    }
}
