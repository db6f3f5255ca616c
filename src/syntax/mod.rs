//! Parser-neutral statement tree.
//!
//! A concrete frontend (see [`go`]) lowers its syntax tree into these types,
//! keeping only what statement extraction needs: the shape of each
//! statement and its source range. The extractor never looks at concrete
//! node kinds.

pub mod go;

use std::fmt;
use std::path::PathBuf;

use crate::position::{Position, Range};

/// How the extractor treats a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Contributes its children, never itself.
    Container,
    /// Control-flow statement processed through its sub-parts.
    Compound,
    /// An atomic statement.
    Leaf,
}

/// The control-flow construct behind a [`Compound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundKind {
    If,
    For,
    Range,
    Switch,
    TypeSwitch,
    Select,
    Labeled,
}

impl CompoundKind {
    /// Everything except labeled statements wraps its body in braces.
    pub fn requires_container_body(&self) -> bool {
        !matches!(self, CompoundKind::Labeled)
    }
}

impl fmt::Display for CompoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompoundKind::If => "if",
            CompoundKind::For => "for",
            CompoundKind::Range => "range",
            CompoundKind::Switch => "switch",
            CompoundKind::TypeSwitch => "type switch",
            CompoundKind::Select => "select",
            CompoundKind::Labeled => "labeled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtNode {
    Container(Container),
    Compound(Compound),
    Leaf(Leaf),
}

impl StmtNode {
    pub fn kind(&self) -> StatementKind {
        match self {
            StmtNode::Container(_) => StatementKind::Container,
            StmtNode::Compound(_) => StatementKind::Compound,
            StmtNode::Leaf(_) => StatementKind::Leaf,
        }
    }

    pub fn range(&self) -> Range {
        match self {
            StmtNode::Container(c) => c.range,
            StmtNode::Compound(c) => c.range,
            StmtNode::Leaf(l) => l.range,
        }
    }

    /// Shorthand for a leaf without nested function literals.
    pub fn leaf(range: Range) -> Self {
        StmtNode::Leaf(Leaf {
            range,
            nested: Vec::new(),
        })
    }
}

/// A brace-delimited block or clause body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub range: Range,
    pub children: Vec<StmtNode>,
}

/// The branch taken when a conditional's condition is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternate {
    /// Where the `else` keyword starts, when the parser recorded it.
    pub keyword: Option<Position>,
    pub node: Box<StmtNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compound {
    pub kind: CompoundKind,
    pub range: Range,
    pub init: Option<Box<StmtNode>>,
    /// Condition, range clause, switch tag or type-switch guard.
    pub condition: Option<Box<StmtNode>>,
    pub body: Option<Box<StmtNode>>,
    pub alternate: Option<Alternate>,
    pub post: Option<Box<StmtNode>>,
}

impl Compound {
    /// A compound with only a kind and range; sub-parts are filled in by the caller.
    pub fn new(kind: CompoundKind, range: Range) -> Self {
        Self {
            kind,
            range,
            init: None,
            condition: None,
            body: None,
            alternate: None,
            post: None,
        }
    }
}

/// An atomic statement. `nested` holds the bodies of function literals that
/// appear inside it, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub range: Range,
    pub nested: Vec<Container>,
}

/// A named function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    pub range: Range,
    pub body: Option<Container>,
}

/// Every function declaration found in one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub functions: Vec<FunctionDecl>,
}
