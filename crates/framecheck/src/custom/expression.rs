//! Row predicates for custom rules.
//!
//! Queries are SQL-style boolean expressions (`age > 80 AND status IN ('A',
//! 'B')`). They are parsed with `sqlparser`, then bound to a table: column
//! references are resolved to positions and anything the evaluator does not
//! understand is rejected up front, so evaluation itself cannot fail.

use std::cmp::Ordering;

use regex::Regex;
use sqlparser::ast::{self, BinaryOperator, Expr, UnaryOperator};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;

use crate::error::{FrameCheckError, Result};
use crate::input::{parse_datetime, DataTable, Value};

/// Parse a query into a syntax tree, rejecting trailing input.
pub fn parse_query(query: &str) -> std::result::Result<Expr, String> {
    let dialect = GenericDialect {};
    let mut parser = Parser::new(&dialect)
        .try_with_sql(query)
        .map_err(|e| e.to_string())?;
    let expr = parser.parse_expr().map_err(|e| e.to_string())?;

    let next = parser.peek_token();
    if next.token != Token::EOF {
        return Err(format!("unexpected '{}' after expression", next.token));
    }
    Ok(expr)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl Comparison {
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::NotEq => ordering != Ordering::Equal,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::LtEq => ordering != Ordering::Greater,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::GtEq => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arithmetic {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, Clone)]
enum Node {
    Column(usize),
    Literal(Value),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),
    Negate(Box<Node>),
    Compare(Comparison, Box<Node>, Box<Node>),
    Arithmetic(Arithmetic, Box<Node>, Box<Node>),
    InList {
        expr: Box<Node>,
        list: Vec<Node>,
        negated: bool,
    },
    Between {
        expr: Box<Node>,
        low: Box<Node>,
        high: Box<Node>,
        negated: bool,
    },
    IsNull {
        expr: Box<Node>,
        negated: bool,
    },
    Like {
        expr: Box<Node>,
        pattern: Regex,
        negated: bool,
    },
}

/// A query bound to the columns of one table.
#[derive(Debug, Clone)]
pub struct RowPredicate {
    root: Node,
}

impl RowPredicate {
    /// Parse `query` and bind it to `table`.
    ///
    /// Syntax errors and unsupported constructs are reported as invalid
    /// queries for `rule`; unknown columns as lookup errors.
    pub fn compile(rule: &str, query: &str, table: &DataTable) -> Result<Self> {
        let invalid = |message: String| FrameCheckError::InvalidQuery {
            rule: rule.to_string(),
            message,
        };

        let expr = parse_query(query).map_err(invalid)?;
        let root = Binder { table }.bind(&expr).map_err(|e| match e {
            BindError::Unsupported(message) => invalid(message),
            BindError::UnknownColumn(column) => FrameCheckError::column_not_found(column),
        })?;

        Ok(Self { root })
    }

    /// Returns true if the predicate holds for `row`.
    pub fn matches(&self, table: &DataTable, row: usize) -> bool {
        truthy(&evaluate(&self.root, &RowView { table, row }))
    }

    /// Positions of every row the predicate holds for.
    pub fn matching_rows(&self, table: &DataTable) -> Vec<usize> {
        (0..table.row_count())
            .filter(|&row| self.matches(table, row))
            .collect()
    }
}

enum BindError {
    Unsupported(String),
    UnknownColumn(String),
}

struct Binder<'a> {
    table: &'a DataTable,
}

impl Binder<'_> {
    fn bind(&self, expr: &Expr) -> std::result::Result<Node, BindError> {
        let node = match expr {
            Expr::Identifier(ident) => self.bind_identifier(ident)?,
            Expr::CompoundIdentifier(parts) => {
                let name = parts
                    .iter()
                    .map(|part| part.value.as_str())
                    .collect::<Vec<_>>()
                    .join(".");
                self.column(&name)?
            }
            Expr::Value(value) => Node::Literal(literal(value)?),
            Expr::Nested(inner) => self.bind(inner)?,
            Expr::UnaryOp { op, expr } => {
                let inner = Box::new(self.bind(expr)?);
                match op {
                    UnaryOperator::Not => Node::Not(inner),
                    UnaryOperator::Minus => Node::Negate(inner),
                    UnaryOperator::Plus => *inner,
                    other => return Err(unsupported(format!("operator '{}'", other))),
                }
            }
            Expr::BinaryOp { left, op, right } => {
                let left = Box::new(self.bind(left)?);
                let right = Box::new(self.bind(right)?);
                match op {
                    BinaryOperator::And => Node::And(left, right),
                    BinaryOperator::Or => Node::Or(left, right),
                    BinaryOperator::Eq => Node::Compare(Comparison::Eq, left, right),
                    BinaryOperator::NotEq => Node::Compare(Comparison::NotEq, left, right),
                    BinaryOperator::Lt => Node::Compare(Comparison::Lt, left, right),
                    BinaryOperator::LtEq => Node::Compare(Comparison::LtEq, left, right),
                    BinaryOperator::Gt => Node::Compare(Comparison::Gt, left, right),
                    BinaryOperator::GtEq => Node::Compare(Comparison::GtEq, left, right),
                    BinaryOperator::Plus => Node::Arithmetic(Arithmetic::Add, left, right),
                    BinaryOperator::Minus => Node::Arithmetic(Arithmetic::Subtract, left, right),
                    BinaryOperator::Multiply => Node::Arithmetic(Arithmetic::Multiply, left, right),
                    BinaryOperator::Divide => Node::Arithmetic(Arithmetic::Divide, left, right),
                    BinaryOperator::Modulo => Node::Arithmetic(Arithmetic::Modulo, left, right),
                    other => return Err(unsupported(format!("operator '{}'", other))),
                }
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => Node::InList {
                expr: Box::new(self.bind(expr)?),
                list: list
                    .iter()
                    .map(|item| self.bind(item))
                    .collect::<std::result::Result<_, _>>()?,
                negated: *negated,
            },
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => Node::Between {
                expr: Box::new(self.bind(expr)?),
                low: Box::new(self.bind(low)?),
                high: Box::new(self.bind(high)?),
                negated: *negated,
            },
            Expr::IsNull(inner) => Node::IsNull {
                expr: Box::new(self.bind(inner)?),
                negated: false,
            },
            Expr::IsNotNull(inner) => Node::IsNull {
                expr: Box::new(self.bind(inner)?),
                negated: true,
            },
            Expr::Like {
                negated,
                expr,
                pattern,
                ..
            } => {
                let pattern = match self.bind(pattern)? {
                    Node::Literal(Value::Text(text)) => like_regex(&text)?,
                    _ => return Err(unsupported("LIKE pattern must be a string".to_string())),
                };
                Node::Like {
                    expr: Box::new(self.bind(expr)?),
                    pattern,
                    negated: *negated,
                }
            }
            other => return Err(unsupported(format!("expression '{}'", other))),
        };
        Ok(node)
    }

    /// A double-quoted name that is not a column reads as a string.
    fn bind_identifier(&self, ident: &ast::Ident) -> std::result::Result<Node, BindError> {
        if ident.quote_style == Some('"') && !self.table.contains_column(&ident.value) {
            return Ok(Node::Literal(Value::Text(ident.value.clone())));
        }
        self.column(&ident.value)
    }

    fn column(&self, name: &str) -> std::result::Result<Node, BindError> {
        self.table
            .column_names()
            .position(|column| column == name)
            .map(Node::Column)
            .ok_or_else(|| BindError::UnknownColumn(name.to_string()))
    }
}

fn unsupported(message: String) -> BindError {
    BindError::Unsupported(format!("unsupported {}", message))
}

fn literal(value: &ast::Value) -> std::result::Result<Value, BindError> {
    let converted = match value {
        ast::Value::Number(text, _) => match text.parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| unsupported(format!("number '{}'", text)))?,
        },
        ast::Value::SingleQuotedString(s) | ast::Value::DoubleQuotedString(s) => {
            Value::Text(s.clone())
        }
        ast::Value::Boolean(b) => Value::Bool(*b),
        ast::Value::Null => Value::Null,
        other => return Err(unsupported(format!("literal '{}'", other))),
    };
    Ok(converted)
}

/// Translate a SQL LIKE pattern (`%`, `_`) into an anchored regex.
fn like_regex(pattern: &str) -> std::result::Result<Regex, BindError> {
    let mut regex = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            c => regex.push_str(&regex::escape(&c.to_string())),
        }
    }
    regex.push('$');
    Regex::new(&regex).map_err(|e| unsupported(format!("LIKE pattern: {}", e)))
}

struct RowView<'a> {
    table: &'a DataTable,
    row: usize,
}

fn evaluate(node: &Node, view: &RowView<'_>) -> Value {
    match node {
        Node::Column(index) => view
            .table
            .columns()
            .nth(*index)
            .map(|column| column.get(view.row).clone())
            .unwrap_or_default(),
        Node::Literal(value) => value.clone(),
        Node::And(left, right) => {
            Value::Bool(truthy(&evaluate(left, view)) && truthy(&evaluate(right, view)))
        }
        Node::Or(left, right) => {
            Value::Bool(truthy(&evaluate(left, view)) || truthy(&evaluate(right, view)))
        }
        Node::Not(inner) => Value::Bool(!truthy(&evaluate(inner, view))),
        Node::Negate(inner) => match evaluate(inner, view) {
            Value::Int(i) => i.checked_neg().map_or(Value::Float(-(i as f64)), Value::Int),
            Value::Float(f) => Value::Float(-f),
            _ => Value::Null,
        },
        Node::Compare(op, left, right) => {
            Value::Bool(compare(*op, &evaluate(left, view), &evaluate(right, view)))
        }
        Node::Arithmetic(op, left, right) => {
            arithmetic(*op, &evaluate(left, view), &evaluate(right, view))
        }
        Node::InList {
            expr,
            list,
            negated,
        } => {
            let value = evaluate(expr, view);
            if value.is_null() {
                return Value::Bool(false);
            }
            let found = list
                .iter()
                .any(|item| compare(Comparison::Eq, &value, &evaluate(item, view)));
            Value::Bool(found != *negated)
        }
        Node::Between {
            expr,
            low,
            high,
            negated,
        } => {
            let value = evaluate(expr, view);
            if value.is_null() {
                return Value::Bool(false);
            }
            let inside = compare(Comparison::GtEq, &value, &evaluate(low, view))
                && compare(Comparison::LtEq, &value, &evaluate(high, view));
            Value::Bool(inside != *negated)
        }
        Node::IsNull { expr, negated } => Value::Bool(evaluate(expr, view).is_null() != *negated),
        Node::Like {
            expr,
            pattern,
            negated,
        } => {
            let value = evaluate(expr, view);
            if value.is_null() {
                return Value::Bool(false);
            }
            Value::Bool(pattern.is_match(&value.render()) != *negated)
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => !f.is_nan() && *f != 0.0,
        Value::Text(s) => !s.is_empty(),
        Value::DateTime(_) => true,
        Value::Null => false,
    }
}

/// Any comparison involving a null is false.
fn compare(op: Comparison, left: &Value, right: &Value) -> bool {
    if left.is_null() || right.is_null() {
        return false;
    }

    // Text compared with a timestamp is read as a date
    let ordering = match (left, right) {
        (Value::DateTime(dt), Value::Text(s)) => parse_datetime(s).map(|other| dt.cmp(&other)),
        (Value::Text(s), Value::DateTime(dt)) => parse_datetime(s).map(|other| other.cmp(dt)),
        _ => left.compare(right),
    };

    match ordering {
        Some(ordering) => op.holds(ordering),
        // Values of unrelated kinds are never equal
        None => op == Comparison::NotEq,
    }
}

fn arithmetic(op: Arithmetic, left: &Value, right: &Value) -> Value {
    if let (Value::Text(a), Value::Text(b), Arithmetic::Add) = (left, right, op) {
        return Value::Text(format!("{}{}", a, b));
    }

    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let exact = match op {
            Arithmetic::Add => a.checked_add(*b),
            Arithmetic::Subtract => a.checked_sub(*b),
            Arithmetic::Multiply => a.checked_mul(*b),
            Arithmetic::Modulo => a.checked_rem_euclid(*b),
            Arithmetic::Divide => None,
        };
        if let Some(result) = exact {
            return Value::Int(result);
        }
        if op == Arithmetic::Modulo {
            return Value::Null;
        }
    }

    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Value::Null;
    };
    Value::Float(match op {
        Arithmetic::Add => a + b,
        Arithmetic::Subtract => a - b,
        Arithmetic::Multiply => a * b,
        Arithmetic::Divide => a / b,
        Arithmetic::Modulo => a.rem_euclid(b),
    })
}
