//! Statement extraction over the neutral statement tree.
//!
//! Walks each function body depth-first, left to right. Containers give up
//! their children, compounds are visited through their sub-parts
//! (initializer, condition, body, alternate, post) and every leaf becomes a
//! [`Statement`], followed by the statements of any function literal it
//! contains.

use std::path::{Path, PathBuf};

use crate::error::{CheckError, Result};
use crate::model::{Function, Statement};
use crate::position::{Position, Range};
use crate::syntax::{Alternate, Compound, CompoundKind, Container, SourceUnit, StmtNode};

/// Width of `else ` in bytes, used to approximate the keyword's position
/// when the parser did not record it.
pub const ELSE_BACKUP: u32 = "else ".len() as u32;

/// Extract the statements of every function in `unit`.
pub fn extract_functions(unit: &SourceUnit) -> Result<Vec<Function>> {
    unit.functions
        .iter()
        .map(|decl| {
            let body = decl.body.as_ref().ok_or_else(|| {
                invalid(&unit.path, decl.range.start, format!("function {} has no body", decl.name))
            })?;
            let statements = extract_statements(&unit.path, body)?;
            Ok(Function {
                name: decl.name.clone(),
                source_path: unit.path.clone(),
                range: decl.range,
                statements,
            })
        })
        .collect()
}

/// Extract the statements under one container, in traversal order.
pub fn extract_statements(path: &Path, body: &Container) -> Result<Vec<Statement>> {
    let mut collector = Collector {
        path: path.to_path_buf(),
        statements: Vec::new(),
    };
    collector.container(body.range, &body.children)?;
    Ok(collector.statements)
}

fn invalid(path: &Path, at: Position, message: String) -> CheckError {
    CheckError::InvalidTree {
        path: path.to_path_buf(),
        line: at.line,
        column: at.column,
        message,
    }
}

struct Collector {
    path: PathBuf,
    statements: Vec<Statement>,
}

impl Collector {
    fn node(&mut self, node: &StmtNode) -> Result<()> {
        match node {
            StmtNode::Container(c) => self.container(c.range, &c.children),
            StmtNode::Compound(c) => self.compound(c),
            StmtNode::Leaf(leaf) => {
                self.statements.push(Statement::new(leaf.range));
                for nested in &leaf.nested {
                    self.container(nested.range, &nested.children)?;
                }
                Ok(())
            }
        }
    }

    fn container(&mut self, range: Range, children: &[StmtNode]) -> Result<()> {
        if range.is_inverted() {
            return Err(invalid(
                &self.path,
                range.start,
                format!("block range {range} ends before it starts"),
            ));
        }
        for child in children {
            let child_range = child.range();
            if !range.contains(&child_range) {
                return Err(invalid(
                    &self.path,
                    child_range.start,
                    format!("statement {child_range} escapes its enclosing block {range}"),
                ));
            }
            self.node(child)?;
        }
        Ok(())
    }

    fn compound(&mut self, compound: &Compound) -> Result<()> {
        let body = compound.body.as_deref().ok_or_else(|| {
            invalid(
                &self.path,
                compound.range.start,
                format!("{} statement has no body", compound.kind),
            )
        })?;
        if compound.kind.requires_container_body() && !matches!(body, StmtNode::Container(_)) {
            return Err(invalid(
                &self.path,
                body.range().start,
                format!("{} statement body is not a block", compound.kind),
            ));
        }

        if let Some(init) = &compound.init {
            self.node(init)?;
        }
        if let Some(condition) = &compound.condition {
            self.node(condition)?;
        }
        self.node(body)?;
        if let Some(alternate) = &compound.alternate {
            self.alternate(alternate)?;
        }
        if let Some(post) = &compound.post {
            self.node(post)?;
        }
        Ok(())
    }

    /// The tree has no node for `else`, so the alternate branch is treated as
    /// a block that starts at the keyword.
    fn alternate(&mut self, alternate: &Alternate) -> Result<()> {
        let node = alternate.node.as_ref();
        let keyword_at =
            |start: Position| alternate.keyword.unwrap_or_else(|| start.back_up(ELSE_BACKUP));

        match node {
            StmtNode::Compound(nested) if nested.kind == CompoundKind::If => {
                let range = Range::new(keyword_at(nested.range.start), nested.range.end);
                self.container(range, std::slice::from_ref(node))
            }
            StmtNode::Container(block) => {
                let range = Range::new(keyword_at(block.range.start), block.range.end);
                self.container(range, &block.children)
            }
            other => Err(invalid(
                &self.path,
                other.range().start,
                "else branch is neither a block nor an if statement".to_string(),
            )),
        }
    }
}
