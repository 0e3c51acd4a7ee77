//! Ancestor context for identifier visits.
//!
//! The traversal pushes a frame for every node kind whose relationship to a
//! descendant identifier changes how that identifier may be rewritten. Child
//! positions are recorded as spans and compared against the identifier's
//! span, so unrelated nodes between a frame and the identifier never produce
//! a false match.

use oxc_ast::ast::UnaryOperator;
use oxc_span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Unary { operator: UnaryOperator, argument: Span },
    Property { shorthand: bool, value: Span },
    New { callee: Span },
    Call { callee: Span },
    Member { object: Span, span: Span },
    /// The identifier being visited is written to.
    AssignTarget,
    WithBody,
    Function { arrow: bool },
}

#[derive(Debug, Default)]
pub struct NodePath {
    frames: Vec<Frame>,
}

impl NodePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn parent(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn is_typeof_operand(&self, span: Span) -> bool {
        matches!(
            self.parent(),
            Some(Frame::Unary { operator: UnaryOperator::Typeof, argument }) if *argument == span
        )
    }

    /// `{ name }` written in shorthand, where the identifier is the value.
    pub fn is_shorthand_value(&self, span: Span) -> bool {
        matches!(
            self.parent(),
            Some(Frame::Property { shorthand: true, value }) if *value == span
        )
    }

    pub fn is_write_target(&self) -> bool {
        matches!(self.parent(), Some(Frame::AssignTarget))
    }

    pub fn in_with_body(&self) -> bool {
        self.frames.iter().any(|frame| matches!(frame, Frame::WithBody))
    }

    /// Inside a function that has its own `arguments` object.
    pub fn in_plain_function(&self) -> bool {
        self.frames
            .iter()
            .any(|frame| matches!(frame, Frame::Function { arrow: false }))
    }

    /// Whether replacing the node at `span` with a call would change what
    /// `new` constructs, as in `new a.b()` becoming `new f().b()`.
    ///
    /// Walks up through member expressions whose object is the current node
    /// and reports whether the chain ends as the callee of a `new`.
    pub fn needs_new_parens(&self, span: Span) -> bool {
        let mut current = span;

        for frame in self.frames.iter().rev() {
            match frame {
                Frame::Member { object, span } if *object == current => {
                    current = *span;
                }
                Frame::New { callee } => return *callee == current,
                _ => return false,
            }
        }

        false
    }
}
