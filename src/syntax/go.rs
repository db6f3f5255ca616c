//! Go frontend: parses source with tree-sitter and lowers the concrete
//! syntax tree into the neutral statement tree.

use std::path::Path;

use log::debug;
use tree_sitter::{Node, Parser, Tree};

use super::{
    Alternate, Compound, CompoundKind, Container, FunctionDecl, Leaf, SourceUnit, StmtNode,
};
use crate::error::{CheckError, Result};
use crate::position::{Position, Range};

pub mod nodes {
    pub const FUNCTION_DECLARATION: &str = "function_declaration";
    pub const METHOD_DECLARATION: &str = "method_declaration";
    pub const FUNC_LITERAL: &str = "func_literal";
    pub const BLOCK: &str = "block";
    pub const STATEMENT_LIST: &str = "statement_list";
    pub const IF_STATEMENT: &str = "if_statement";
    pub const FOR_STATEMENT: &str = "for_statement";
    pub const FOR_CLAUSE: &str = "for_clause";
    pub const RANGE_CLAUSE: &str = "range_clause";
    pub const EXPRESSION_SWITCH_STATEMENT: &str = "expression_switch_statement";
    pub const TYPE_SWITCH_STATEMENT: &str = "type_switch_statement";
    pub const SELECT_STATEMENT: &str = "select_statement";
    pub const LABELED_STATEMENT: &str = "labeled_statement";
    pub const EXPRESSION_CASE: &str = "expression_case";
    pub const TYPE_CASE: &str = "type_case";
    pub const DEFAULT_CASE: &str = "default_case";
    pub const COMMUNICATION_CASE: &str = "communication_case";
    pub const EMPTY_STATEMENT: &str = "empty_statement";
    pub const COMMENT: &str = "comment";
}

pub mod fields {
    pub const NAME: &str = "name";
    pub const BODY: &str = "body";
    pub const INITIALIZER: &str = "initializer";
    pub const CONDITION: &str = "condition";
    pub const CONSEQUENCE: &str = "consequence";
    pub const ALTERNATIVE: &str = "alternative";
    pub const UPDATE: &str = "update";
    pub const VALUE: &str = "value";
    pub const ALIAS: &str = "alias";
    pub const TYPE: &str = "type";
    pub const COMMUNICATION: &str = "communication";
    pub const LABEL: &str = "label";
}

/// Parse one Go source file into the neutral statement tree.
pub fn parse_source(path: &Path, source: &str) -> Result<SourceUnit> {
    let tree = parse_tree(path, source)?;
    let root = tree.root_node();

    if root.has_error() {
        let bad = first_error(root).unwrap_or(root);
        let start = start_of(&bad);
        let message = if bad.is_missing() {
            format!("missing `{}`", bad.kind())
        } else {
            let snippet: String = node_text(&bad, source).chars().take(32).collect();
            format!("syntax error near `{}`", snippet.trim())
        };
        return Err(CheckError::Parse {
            path: path.to_path_buf(),
            line: start.line,
            column: start.column,
            message,
        });
    }

    let lowering = Lowering { source };
    let mut functions = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            nodes::FUNCTION_DECLARATION | nodes::METHOD_DECLARATION => {
                if let Some(function) = lowering.function(child) {
                    functions.push(function);
                }
            }
            _ => {}
        }
    }

    debug!(
        "{}: {} function declarations",
        path.display(),
        functions.len()
    );

    Ok(SourceUnit {
        path: path.to_path_buf(),
        functions,
    })
}

fn parse_tree(path: &Path, source: &str) -> Result<Tree> {
    let parse_error = |message: String| CheckError::Parse {
        path: path.to_path_buf(),
        line: 1,
        column: 1,
        message,
    };

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| parse_error(format!("could not load the Go grammar: {e}")))?;
    parser
        .parse(source, None)
        .ok_or_else(|| parse_error("the parser did not produce a tree".to_string()))
}

/// Depth-first search for the first error or missing node.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

fn start_of(node: &Node) -> Position {
    let p = node.start_position();
    Position::new(p.row as u32 + 1, p.column as u32 + 1, node.start_byte())
}

fn end_of(node: &Node) -> Position {
    let p = node.end_position();
    Position::new(p.row as u32 + 1, p.column as u32 + 1, node.end_byte())
}

fn range_of(node: &Node) -> Range {
    Range::new(start_of(node), end_of(node))
}

/// First anonymous child token with the given text, e.g. `else` or `{`.
fn token<'t>(node: Node<'t>, text: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|child| !child.is_named() && child.kind() == text);
    found
}

struct Lowering<'s> {
    source: &'s str,
}

impl Lowering<'_> {
    fn function(&self, node: Node) -> Option<FunctionDecl> {
        let name = node
            .child_by_field_name(fields::NAME)
            .map(|n| node_text(&n, self.source).to_string())
            .unwrap_or_default();

        let Some(body) = node.child_by_field_name(fields::BODY) else {
            debug!("skipping {name}: declaration has no body");
            return None;
        };

        Some(FunctionDecl {
            name,
            range: range_of(&node),
            body: Some(self.block(body)),
        })
    }

    fn statement(&self, node: Node) -> Option<StmtNode> {
        if node.is_extra() {
            return None;
        }
        let stmt = match node.kind() {
            nodes::BLOCK => StmtNode::Container(self.block(node)),
            nodes::IF_STATEMENT => self.if_statement(node),
            nodes::FOR_STATEMENT => self.for_statement(node),
            nodes::EXPRESSION_SWITCH_STATEMENT => self.switch_statement(node),
            nodes::TYPE_SWITCH_STATEMENT => self.type_switch_statement(node),
            nodes::SELECT_STATEMENT => self.select_statement(node),
            nodes::LABELED_STATEMENT => return self.labeled_statement(node),
            nodes::EMPTY_STATEMENT | nodes::COMMENT => return None,
            _ => StmtNode::Leaf(self.leaf(node)),
        };
        Some(stmt)
    }

    fn block(&self, node: Node) -> Container {
        Container {
            range: range_of(&node),
            children: self.statements_in(node, &[]),
        }
    }

    /// Statements directly under `node`, skipping children attached to any of
    /// `skip_fields` (case values, case types, communication clauses).
    fn statements_in(&self, node: Node, skip_fields: &[&str]) -> Vec<StmtNode> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                let skipped = cursor
                    .field_name()
                    .is_some_and(|field| skip_fields.contains(&field));
                if child.is_named() && !child.is_extra() && !skipped {
                    if child.kind() == nodes::STATEMENT_LIST {
                        out.extend(self.statements_in(child, &[]));
                    } else if let Some(stmt) = self.statement(child) {
                        out.push(stmt);
                    }
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }
        out
    }

    fn leaf(&self, node: Node) -> Leaf {
        let mut nested = Vec::new();
        self.collect_func_literals(node, &mut nested);
        Leaf {
            range: range_of(&node),
            nested,
        }
    }

    fn leaf_field(&self, node: Node, field: &str) -> Option<Box<StmtNode>> {
        node.child_by_field_name(field)
            .map(|child| Box::new(StmtNode::Leaf(self.leaf(child))))
    }

    fn collect_func_literals(&self, node: Node, out: &mut Vec<Container>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == nodes::FUNC_LITERAL {
                if let Some(body) = child.child_by_field_name(fields::BODY) {
                    out.push(self.block(body));
                }
            } else {
                self.collect_func_literals(child, out);
            }
        }
    }

    fn if_statement(&self, node: Node) -> StmtNode {
        let mut compound = Compound::new(CompoundKind::If, range_of(&node));
        compound.init = self.leaf_field(node, fields::INITIALIZER);
        compound.condition = self.leaf_field(node, fields::CONDITION);
        compound.body = node
            .child_by_field_name(fields::CONSEQUENCE)
            .map(|b| Box::new(StmtNode::Container(self.block(b))));

        if let Some(alternative) = node.child_by_field_name(fields::ALTERNATIVE) {
            if let Some(alt) = self.statement(alternative) {
                compound.alternate = Some(Alternate {
                    keyword: token(node, "else").map(|t| start_of(&t)),
                    node: Box::new(alt),
                });
            }
        }

        StmtNode::Compound(compound)
    }

    fn for_statement(&self, node: Node) -> StmtNode {
        let mut compound = Compound::new(CompoundKind::For, range_of(&node));
        compound.body = node
            .child_by_field_name(fields::BODY)
            .map(|b| Box::new(StmtNode::Container(self.block(b))));

        let mut header = None;
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                if child.is_named() && !child.is_extra() && cursor.field_name() != Some(fields::BODY)
                {
                    header = Some(child);
                    break;
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }

        match header {
            Some(clause) if clause.kind() == nodes::FOR_CLAUSE => {
                compound.init = self.leaf_field(clause, fields::INITIALIZER);
                compound.condition = self.leaf_field(clause, fields::CONDITION);
                compound.post = self.leaf_field(clause, fields::UPDATE);
            }
            Some(clause) if clause.kind() == nodes::RANGE_CLAUSE => {
                compound.kind = CompoundKind::Range;
                compound.condition = Some(Box::new(StmtNode::Leaf(self.leaf(clause))));
            }
            Some(condition) => {
                compound.condition = Some(Box::new(StmtNode::Leaf(self.leaf(condition))));
            }
            None => {}
        }

        StmtNode::Compound(compound)
    }

    /// The brace-delimited list of clauses of a switch or select, which the
    /// tree does not model as a node of its own.
    fn clause_body(&self, node: Node, case_kinds: &[&str], skip_fields: &[&str]) -> Option<Box<StmtNode>> {
        let lbrace = token(node, "{")?;
        let range = Range::new(start_of(&lbrace), end_of(&node));

        let mut children = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if case_kinds.contains(&child.kind()) {
                children.push(StmtNode::Container(Container {
                    range: range_of(&child),
                    children: self.statements_in(child, skip_fields),
                }));
            }
        }

        Some(Box::new(StmtNode::Container(Container { range, children })))
    }

    fn switch_statement(&self, node: Node) -> StmtNode {
        let mut compound = Compound::new(CompoundKind::Switch, range_of(&node));
        compound.init = self.leaf_field(node, fields::INITIALIZER);
        compound.condition = self.leaf_field(node, fields::VALUE);
        compound.body = self.clause_body(
            node,
            &[nodes::EXPRESSION_CASE, nodes::DEFAULT_CASE],
            &[fields::VALUE],
        );
        StmtNode::Compound(compound)
    }

    fn type_switch_statement(&self, node: Node) -> StmtNode {
        let mut compound = Compound::new(CompoundKind::TypeSwitch, range_of(&node));
        compound.init = self.leaf_field(node, fields::INITIALIZER);
        compound.condition = self.type_switch_guard(node);
        compound.body = self.clause_body(
            node,
            &[nodes::TYPE_CASE, nodes::DEFAULT_CASE],
            &[fields::TYPE],
        );
        StmtNode::Compound(compound)
    }

    /// `v := x.(type)` has no node of its own: it runs from the alias (or the
    /// value when there is no alias) to the `)` closing `.(type)`.
    fn type_switch_guard(&self, node: Node) -> Option<Box<StmtNode>> {
        let value = node.child_by_field_name(fields::VALUE)?;
        let first = node.child_by_field_name(fields::ALIAS).unwrap_or(value);
        let last = token(node, "{")
            .and_then(|lbrace| lbrace.prev_sibling())
            .unwrap_or(value);

        let mut nested = Vec::new();
        self.collect_func_literals(value, &mut nested);
        Some(Box::new(StmtNode::Leaf(Leaf {
            range: Range::new(start_of(&first), end_of(&last)),
            nested,
        })))
    }

    fn select_statement(&self, node: Node) -> StmtNode {
        let mut compound = Compound::new(CompoundKind::Select, range_of(&node));
        compound.body = self.clause_body(
            node,
            &[nodes::COMMUNICATION_CASE, nodes::DEFAULT_CASE],
            &[fields::COMMUNICATION],
        );
        StmtNode::Compound(compound)
    }

    fn labeled_statement(&self, node: Node) -> Option<StmtNode> {
        let mut inner = None;
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                if child.is_named() && !child.is_extra() && cursor.field_name() != Some(fields::LABEL)
                {
                    inner = Some(child);
                    break;
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }

        // A label right before a closing brace labels nothing executable.
        let body = self.statement(inner?)?;
        let mut compound = Compound::new(CompoundKind::Labeled, range_of(&node));
        compound.body = Some(Box::new(body));
        Some(StmtNode::Compound(compound))
    }
}
