//! Read-only structural queries over the graph store.
//!
//! A deliberately small, Cypher-shaped surface: one `MATCH` pattern of at
//! most two node terms joined by one relationship term, plus projections.
//!
//! ```text
//! MATCH (n:Function) RETURN n.name, n.file_path
//! MATCH (a:File)-[:IMPORTS]->(b:File) RETURN a.file_path, b.file_path
//! MATCH (a:Function)-[:CALLS*1..3]->(b) RETURN b.id LIMIT 20
//! ```
//!
//! Labels match node kinds (underscore-insensitive, case-insensitive);
//! relationship types match edge kinds. Path bounds are capped so a query
//! cannot walk unboundedly.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::store::GraphStore;
use crate::types::{GraphError, GraphNode};

/// Longest hop bound a path pattern may request.
const MAX_PATH_BOUND: usize = 10;

/// Result table: projected column names plus one row per match.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
struct NodeTerm {
    var: Option<String>,
    label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct EdgeTerm {
    kind: Option<String>,
    min_hops: usize,
    max_hops: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct Projection {
    var: String,
    property: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct Statement {
    left: NodeTerm,
    edge: Option<(EdgeTerm, NodeTerm)>,
    projections: Vec<Projection>,
    limit: Option<usize>,
}

/// Execute a query statement against the store.
pub fn query(store: &GraphStore, statement: &str) -> Result<QueryRows, GraphError> {
    let stmt = parse(statement)?;
    evaluate(store, &stmt)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(usize),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Dot,
    DotDot,
    Dash,
    Arrow,
    Star,
}

fn tokenize(input: &str) -> Result<Vec<Token>, GraphError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '.' => {
                chars.next();
                if chars.peek() == Some(&'.') {
                    chars.next();
                    tokens.push(Token::DotDot);
                } else {
                    tokens.push(Token::Dot);
                }
            }
            '-' => {
                chars.next();
                tokens.push(Token::Dash);
            }
            '>' => {
                chars.next();
                // `->` arrives as Dash then '>'.
                if tokens.last() == Some(&Token::Dash) {
                    tokens.pop();
                    tokens.push(Token::Arrow);
                } else {
                    return Err(GraphError::Query("unexpected '>'".to_string()));
                }
            }
            c if c.is_ascii_digit() => {
                let mut value = 0usize;
                while let Some(&d) = chars.peek() {
                    if let Some(digit) = d.to_digit(10) {
                        value = value * 10 + digit as usize;
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(GraphError::Query(format!("unexpected character '{other}'")));
            }
        }
    }
    Ok(tokens)
}

struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token, context: &str) -> Result<(), GraphError> {
        match self.next() {
            Some(found) if found == expected => Ok(()),
            found => Err(GraphError::Query(format!(
                "expected {expected:?} {context}, found {found:?}"
            ))),
        }
    }

    fn keyword(&mut self, word: &str) -> Result<(), GraphError> {
        match self.next() {
            Some(Token::Ident(ident)) if ident.eq_ignore_ascii_case(word) => Ok(()),
            found => Err(GraphError::Query(format!(
                "expected keyword {word}, found {found:?}"
            ))),
        }
    }

    fn ident(&mut self, context: &str) -> Result<String, GraphError> {
        match self.next() {
            Some(Token::Ident(ident)) => Ok(ident),
            found => Err(GraphError::Query(format!(
                "expected identifier {context}, found {found:?}"
            ))),
        }
    }
}

fn parse(input: &str) -> Result<Statement, GraphError> {
    let mut stream = TokenStream {
        tokens: tokenize(input)?,
        pos: 0,
    };

    stream.keyword("MATCH")?;
    let left = parse_node(&mut stream)?;

    let edge = if stream.peek() == Some(&Token::Dash) {
        let edge = parse_edge(&mut stream)?;
        let right = parse_node(&mut stream)?;
        Some((edge, right))
    } else {
        None
    };

    stream.keyword("RETURN")?;
    let mut projections = vec![parse_projection(&mut stream)?];
    while stream.peek() == Some(&Token::Comma) {
        stream.next();
        projections.push(parse_projection(&mut stream)?);
    }

    let mut limit = None;
    if let Some(Token::Ident(word)) = stream.peek() {
        if word.eq_ignore_ascii_case("LIMIT") {
            stream.next();
            match stream.next() {
                Some(Token::Number(n)) => limit = Some(n),
                found => {
                    return Err(GraphError::Query(format!(
                        "expected number after LIMIT, found {found:?}"
                    )))
                }
            }
        }
    }

    if let Some(extra) = stream.peek() {
        return Err(GraphError::Query(format!(
            "unexpected trailing token {extra:?}"
        )));
    }

    Ok(Statement {
        left,
        edge,
        projections,
        limit,
    })
}

fn parse_node(stream: &mut TokenStream) -> Result<NodeTerm, GraphError> {
    stream.expect(Token::LParen, "at node pattern")?;
    let mut var = None;
    let mut label = None;
    if let Some(Token::Ident(_)) = stream.peek() {
        var = Some(stream.ident("as node variable")?);
    }
    if stream.peek() == Some(&Token::Colon) {
        stream.next();
        label = Some(stream.ident("as node label")?);
    }
    stream.expect(Token::RParen, "closing node pattern")?;
    Ok(NodeTerm { var, label })
}

fn parse_edge(stream: &mut TokenStream) -> Result<EdgeTerm, GraphError> {
    stream.expect(Token::Dash, "at relationship")?;
    stream.expect(Token::LBracket, "at relationship")?;
    let mut kind = None;
    let (mut min_hops, mut max_hops) = (1usize, 1usize);
    if stream.peek() == Some(&Token::Colon) {
        stream.next();
        kind = Some(stream.ident("as relationship type")?);
    }
    if stream.peek() == Some(&Token::Star) {
        stream.next();
        match (stream.next(), stream.next(), stream.next()) {
            (Some(Token::Number(lo)), Some(Token::DotDot), Some(Token::Number(hi))) => {
                min_hops = lo;
                max_hops = hi;
            }
            _ => {
                return Err(GraphError::Query(
                    "path patterns must be bounded: use *min..max".to_string(),
                ))
            }
        }
    }
    stream.expect(Token::RBracket, "closing relationship")?;
    stream.expect(Token::Arrow, "after relationship")?;

    if min_hops == 0 || min_hops > max_hops || max_hops > MAX_PATH_BOUND {
        return Err(GraphError::Query(format!(
            "path bounds must satisfy 1 <= min <= max <= {MAX_PATH_BOUND}"
        )));
    }
    Ok(EdgeTerm {
        kind,
        min_hops,
        max_hops,
    })
}

fn parse_projection(stream: &mut TokenStream) -> Result<Projection, GraphError> {
    let var = stream.ident("in RETURN clause")?;
    let mut property = None;
    if stream.peek() == Some(&Token::Dot) {
        stream.next();
        property = Some(stream.ident("as property name")?);
    }
    Ok(Projection { var, property })
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn label_matches(node: &GraphNode, label: Option<&str>) -> bool {
    let Some(label) = label else { return true };
    let want: String = label
        .chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let have: String = node.kind_str().chars().filter(|c| *c != '_').collect();
    want == have
}

fn evaluate(store: &GraphStore, stmt: &Statement) -> Result<QueryRows, GraphError> {
    // (left, right) node-id bindings per match; right is None for bare patterns.
    let mut bindings: Vec<(&GraphNode, Option<&GraphNode>)> = Vec::new();

    match &stmt.edge {
        None => {
            for node in store.nodes() {
                if label_matches(node, stmt.left.label.as_deref()) {
                    bindings.push((node, None));
                }
            }
        }
        Some((edge, right)) => {
            // Adjacency restricted to the requested relationship type.
            let mut adjacency: std::collections::HashMap<&str, Vec<&str>> =
                std::collections::HashMap::new();
            for e in store.edges() {
                let type_ok = edge
                    .kind
                    .as_deref()
                    .map(|k| k.eq_ignore_ascii_case(e.kind.as_str()))
                    .unwrap_or(true);
                if type_ok {
                    adjacency.entry(e.source.as_str()).or_default().push(&e.target);
                }
            }

            for start in store.nodes() {
                if !label_matches(start, stmt.left.label.as_deref()) {
                    continue;
                }
                let mut reached: BTreeSet<&str> = BTreeSet::new();
                collect_reachable(
                    &adjacency,
                    start.id.as_str(),
                    start.id.as_str(),
                    edge.min_hops,
                    edge.max_hops,
                    &mut Vec::new(),
                    &mut reached,
                );
                for target_id in reached {
                    if let Some(target) = store.node(target_id) {
                        if label_matches(target, right.label.as_deref()) {
                            bindings.push((start, Some(target)));
                        }
                    }
                }
            }
        }
    }

    let columns: Vec<String> = stmt
        .projections
        .iter()
        .map(|p| match &p.property {
            Some(prop) => format!("{}.{}", p.var, prop),
            None => p.var.clone(),
        })
        .collect();

    let mut rows = Vec::new();
    for (left, right) in bindings {
        let mut row = Vec::with_capacity(stmt.projections.len());
        for projection in &stmt.projections {
            let node = resolve_var(stmt, &projection.var, left, right)?;
            row.push(project(node, projection.property.as_deref())?);
        }
        rows.push(row);
        if let Some(limit) = stmt.limit {
            if rows.len() >= limit {
                break;
            }
        }
    }

    Ok(QueryRows { columns, rows })
}

/// Depth-first enumeration of simple paths within the hop bounds.
#[allow(clippy::too_many_arguments)]
fn collect_reachable<'a>(
    adjacency: &std::collections::HashMap<&str, Vec<&'a str>>,
    start: &str,
    current: &str,
    min_hops: usize,
    max_hops: usize,
    path: &mut Vec<&'a str>,
    reached: &mut BTreeSet<&'a str>,
) {
    if path.len() == max_hops {
        return;
    }
    let Some(next) = adjacency.get(current) else {
        return;
    };
    for &target in next {
        if target == start || path.contains(&target) {
            continue;
        }
        path.push(target);
        if path.len() >= min_hops {
            reached.insert(target);
        }
        collect_reachable(adjacency, start, target, min_hops, max_hops, path, reached);
        path.pop();
    }
}

fn resolve_var<'a>(
    stmt: &Statement,
    var: &str,
    left: &'a GraphNode,
    right: Option<&'a GraphNode>,
) -> Result<&'a GraphNode, GraphError> {
    if stmt.left.var.as_deref() == Some(var) {
        return Ok(left);
    }
    if let Some((_, right_term)) = &stmt.edge {
        if right_term.var.as_deref() == Some(var) {
            return right.ok_or_else(|| GraphError::Internal("unbound right term".to_string()));
        }
    }
    Err(GraphError::Query(format!("unknown variable '{var}'")))
}

fn project(node: &GraphNode, property: Option<&str>) -> Result<Value, GraphError> {
    match property {
        None | Some("id") => Ok(json!(node.id)),
        Some("name") => Ok(json!(node.name)),
        Some("kind") => Ok(json!(node.kind_str())),
        Some("file_path") => Ok(json!(node.file_path)),
        Some("start_line") => Ok(node
            .line_range()
            .map(|(start, _)| json!(start))
            .unwrap_or(Value::Null)),
        Some("end_line") => Ok(node
            .line_range()
            .map(|(_, end)| json!(end))
            .unwrap_or(Value::Null)),
        Some("is_exported") => Ok(json!(node.is_exported())),
        Some(other) => Err(GraphError::Query(format!("unknown property '{other}'"))),
    }
}
