//! Parse Module for the ESM compiler
//!
//! Wraps the oxc parser and semantic builder, and provides the cheap textual
//! scans the orchestrator runs before it commits to a full parse: shebang
//! stripping, directive pragma lookup and literal pre-scans.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::{ArrowFunctionExpression, Class, Expression, Function, Program, ReturnStatement};
use oxc_ast_visit::Visit;
use oxc_parser::{ParseOptions, Parser};
use oxc_semantic::{Scoping, SemanticBuilder};
use oxc_span::SourceType as OxcSourceType;
use oxc_syntax::scope::ScopeFlags;
use regex::Regex;
use std::collections::HashSet;

use crate::options::SourceType;
use crate::scope::top_level_names;
use crate::validate::{CompilerError, SourceLocation};

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT SCANS
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    static ref SHEBANG_RE: Regex = Regex::new(r"^#![^\n\r\u{2028}\u{2029}]*(?:\r\n|[\n\r\u{2028}\u{2029}])?").unwrap();
    /// Whitespace and comments.
    static ref SKIP_RE: Regex = Regex::new(r"^(?:\s|//[^\n\r\u{2028}\u{2029}]*|/\*(?s:.*?)\*/)*").unwrap();
    /// A single-quoted or double-quoted string literal, or a lone semicolon.
    static ref DIRECTIVE_RE: Regex =
        Regex::new(r#"^(?:'((?:\\.|[^'\\])*)'|"((?:\\.|[^"\\])*)"|;)"#).unwrap();
}

/// Remove a leading `#!` line together with its line terminator.
///
/// Returns the remaining source and whether a shebang was present.
pub fn strip_shebang(code: &str) -> (&str, bool) {
    match SHEBANG_RE.find(code) {
        Some(m) => (&code[m.end()..], true),
        None => (code, false),
    }
}

/// Offset of the first character at or after `pos` that is not whitespace or
/// part of a comment.
pub fn skip_trivia(code: &str, pos: usize) -> usize {
    pos + code
        .get(pos..)
        .and_then(|rest| SKIP_RE.find(rest))
        .map_or(0, |m| m.end())
}

/// Byte offset of `pragma` when it appears as a directive in the prologue.
///
/// The scan walks string literals and semicolons only; the first token that
/// is neither ends the prologue.
pub fn index_of_pragma(code: &str, pragma: &str) -> Option<usize> {
    let mut pos = 0;

    loop {
        pos = skip_trivia(code, pos);

        let caps = DIRECTIVE_RE.captures(&code[pos..])?;
        let literal = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());

        if literal == Some(pragma) {
            return Some(pos);
        }

        let consumed = caps.get(0).map_or(0, |m| m.end());
        if consumed == 0 {
            return None;
        }
        pos += consumed;
    }
}

/// Whether `pragma` governs the prologue. When both "use module" and
/// "use script" are present, the one that appears first wins.
pub fn has_pragma(code: &str, pragma: &str) -> bool {
    let Some(index) = index_of_pragma(code, pragma) else {
        return false;
    };

    let rival = match pragma {
        "use module" => "use script",
        "use script" => "use module",
        _ => return true,
    };

    match index_of_pragma(code, rival) {
        Some(rival_index) => rival_index > index,
        None => true,
    }
}

/// Offsets of every whole-word occurrence of any of `names`.
///
/// Identifiers may contain `$`, which `\b` treats as a boundary. The
/// leading boundary is matched and the trailing one is checked by hand, so
/// the following character is left to start the next match.
pub fn find_indexes(code: &str, names: &[&str]) -> Vec<u32> {
    if names.is_empty() {
        return Vec::new();
    }

    // Longest first, so a name is never cut short by one of its prefixes.
    let mut sorted = names.to_vec();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()));

    let alternation = sorted
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");

    let pattern = match Regex::new(&format!(r"(?:^|[^\w$])({})", alternation)) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(error = %e, "could not build index pattern");
            return Vec::new();
        }
    };

    pattern
        .captures_iter(code)
        .filter_map(|caps| caps.get(1))
        .filter(|m| !code[m.end()..].chars().next().is_some_and(is_identifier_char))
        .map(|m| m.start() as u32)
        .collect()
}

fn is_identifier_char(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphanumeric()
}

/// 1-based line and 0-based column of a byte offset.
pub fn line_column(code: &str, offset: u32) -> SourceLocation {
    let offset = (offset as usize).min(code.len());
    let before = &code[..offset];
    let mut line = 1;
    let mut line_start = 0;
    let mut chars = before.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        let terminator = match c {
            '\r' => {
                if let Some((_, '\n')) = chars.peek() {
                    chars.next();
                    Some(index + 2)
                } else {
                    Some(index + 1)
                }
            }
            '\n' => Some(index + 1),
            '\u{2028}' | '\u{2029}' => Some(index + c.len_utf8()),
            _ => None,
        };

        if let Some(next_start) = terminator {
            line += 1;
            line_start = next_start;
        }
    }

    SourceLocation {
        line,
        column: before[line_start.min(before.len())..].chars().count() as u32,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    pub module: bool,
    pub allow_return_outside_function: bool,
    /// Parse script code with strict-mode rules.
    pub strict: bool,
}

impl ParseConfig {
    pub fn source_type(&self) -> SourceType {
        if self.module {
            SourceType::Module
        } else {
            SourceType::Script
        }
    }
}

/// Facts about the program's top level collected alongside the parse.
#[derive(Debug, Clone, Default)]
pub struct TopLevel {
    /// Every name declared in the top-level scope.
    pub identifiers: HashSet<String>,
    pub return_outside_function: bool,
    pub has_use_strict: bool,
    /// Offset right after the directive prologue; hoisted code goes here.
    pub insert_index: u32,
    pub has_directives: bool,
}

pub struct ParsedModule<'a> {
    pub program: &'a Program<'a>,
    pub scoping: Scoping,
    pub top: TopLevel,
}

pub fn parse<'a>(
    allocator: &'a Allocator,
    code: &'a str,
    config: ParseConfig,
) -> Result<ParsedModule<'a>, CompilerError> {
    let source_type = OxcSourceType::default()
        .with_module(config.module)
        .with_always_strict(config.strict);
    let options = ParseOptions {
        allow_return_outside_function: config.allow_return_outside_function,
        preserve_parens: false,
        ..ParseOptions::default()
    };

    let ret = Parser::new(allocator, code, source_type)
        .with_options(options)
        .parse();

    if let Some(error) = ret.errors.first() {
        return Err(CompilerError::syntax(&error.to_string(), config.source_type()));
    }
    if ret.panicked {
        return Err(CompilerError::syntax(
            "Unexpected end of input",
            config.source_type(),
        ));
    }

    let program: &'a Program<'a> = allocator.alloc(ret.program);

    let semantic_ret = SemanticBuilder::new()
        .with_check_syntax_error(true)
        .build(program);

    if let Some(error) = semantic_ret.errors.first() {
        return Err(CompilerError::syntax(&error.to_string(), config.source_type()));
    }

    let scoping = semantic_ret.semantic.into_scoping();

    let mut finder = TopLevelReturnFinder::default();
    finder.visit_program(program);

    let top = TopLevel {
        identifiers: top_level_names(&scoping),
        return_outside_function: finder.found,
        has_use_strict: program
            .directives
            .iter()
            .any(|d| d.directive.as_str() == "use strict"),
        insert_index: program.directives.last().map_or(0, |d| d.span.end),
        has_directives: !program.directives.is_empty(),
    };

    tracing::trace!(
        module = config.module,
        top_level_return = top.return_outside_function,
        "parsed program"
    );

    Ok(ParsedModule {
        program,
        scoping,
        top,
    })
}

/// Looks for `return` outside of any function. Expressions can only hold
/// statements through function bodies, so they are not entered at all.
#[derive(Default)]
struct TopLevelReturnFinder {
    found: bool,
}

impl<'a> Visit<'a> for TopLevelReturnFinder {
    fn visit_return_statement(&mut self, _it: &ReturnStatement<'a>) {
        self.found = true;
    }

    fn visit_expression(&mut self, _it: &Expression<'a>) {}

    fn visit_function(&mut self, _it: &Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _it: &ArrowFunctionExpression<'a>) {}

    fn visit_class(&mut self, _it: &Class<'a>) {}
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
