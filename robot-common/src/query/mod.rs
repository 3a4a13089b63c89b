//! Search query compilation and evaluation
//!
//! Search text is compiled once into a [`QueryTemplate`], whose named
//! placeholders (`$`, `$name`) are bound to concrete values to produce an
//! immutable [`Query`]. A compiled query is plain data: it carries no
//! connection to any store and is sent to the server by value. Field names
//! are not validated at compile time; evaluating a query that names a field
//! the entity lacks fails with [`Error::UnknownField`].

mod parser;

use chumsky::Parser as _;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::Range;

use crate::{Error, Result};

/// Query parser diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// Byte range of the offending input
    pub span: Range<usize>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for ParseError {}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Literal value in a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Num(f64),
    Str(String),
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Value(Literal),
    /// Unbound placeholder, including its leading `$`
    Param(String),
}

/// Query expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Const(bool),
    Compare {
        path: Vec<String>,
        op: CmpOp,
        value: Operand,
    },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn collect_params<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Const(_) => {}
            Expr::Compare { value, .. } => {
                if let Operand::Param(name) = value {
                    out.insert(name);
                }
            }
            Expr::Not(inner) => inner.collect_params(out),
            Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
                lhs.collect_params(out);
                rhs.collect_params(out);
            }
        }
    }

    fn substitute(&self, values: &HashMap<&str, &str>) -> Expr {
        match self {
            Expr::Const(b) => Expr::Const(*b),
            Expr::Compare { path, op, value } => {
                let value = match value {
                    Operand::Param(name) => match values.get(name.as_str()) {
                        Some(v) => Operand::Value(Literal::Str(v.to_string())),
                        None => value.clone(),
                    },
                    Operand::Value(_) => value.clone(),
                };
                Expr::Compare {
                    path: path.clone(),
                    op: *op,
                    value,
                }
            }
            Expr::Not(inner) => Expr::Not(Box::new(inner.substitute(values))),
            Expr::And(lhs, rhs) => Expr::And(
                Box::new(lhs.substitute(values)),
                Box::new(rhs.substitute(values)),
            ),
            Expr::Or(lhs, rhs) => Expr::Or(
                Box::new(lhs.substitute(values)),
                Box::new(rhs.substitute(values)),
            ),
        }
    }

    fn eval(&self, entity: &Value) -> Result<bool> {
        match self {
            Expr::Const(b) => Ok(*b),
            Expr::Compare { path, op, value } => {
                let field = lookup(entity, path).ok_or_else(|| Error::UnknownField(path.join(".")))?;
                Ok(match value {
                    Operand::Value(literal) => compare(field, *op, literal),
                    // Unbound placeholders never match
                    Operand::Param(_) => false,
                })
            }
            Expr::Not(inner) => Ok(!inner.eval(entity)?),
            // Both sides always run so an unknown field fails in either position
            Expr::And(lhs, rhs) => {
                let (l, r) = (lhs.eval(entity)?, rhs.eval(entity)?);
                Ok(l && r)
            }
            Expr::Or(lhs, rhs) => {
                let (l, r) = (lhs.eval(entity)?, rhs.eval(entity)?);
                Ok(l || r)
            }
        }
    }
}

/// Compiled search text with zero or more named placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTemplate {
    source: String,
    params: Vec<String>,
    expr: Expr,
}

impl QueryTemplate {
    /// Text the template was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Declared placeholder names, in binding order
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Bind one value per declared placeholder, positionally
    pub fn bind(&self, values: &[&str]) -> Result<Query> {
        if values.len() != self.params.len() {
            return Err(Error::Parameter {
                expected: self.params.len(),
                actual: values.len(),
            });
        }
        let map: HashMap<&str, &str> = self
            .params
            .iter()
            .map(String::as_str)
            .zip(values.iter().copied())
            .collect();
        Ok(self.apply(&map))
    }

    fn apply(&self, values: &HashMap<&str, &str>) -> Query {
        Query {
            expr: self.expr.substitute(values),
        }
    }
}

/// Immutable compiled predicate over a single entity domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query {
    expr: Expr,
}

impl Query {
    /// Query selecting every entity of a domain
    pub fn all() -> Self {
        Self {
            expr: Expr::Const(true),
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate against an entity in its JSON form
    ///
    /// Fails with [`Error::UnknownField`] when a compared path does not exist
    /// in `entity`.
    pub fn matches(&self, entity: &Value) -> Result<bool> {
        self.expr.eval(entity)
    }
}

/// Compile search text declaring the given placeholder names
///
/// Every placeholder the text uses must be declared; declared names that the
/// text never uses are allowed.
pub fn compile(text: &str, params: &[&str]) -> std::result::Result<QueryTemplate, ParseError> {
    let expr = if text.trim().is_empty() {
        Expr::Const(true)
    } else {
        parser::parser().parse(text).map_err(|errors| {
            errors
                .into_iter()
                .next()
                .map(|e| ParseError {
                    message: e.to_string(),
                    span: e.span(),
                })
                .unwrap_or_else(|| ParseError {
                    message: "invalid query".to_string(),
                    span: 0..text.len(),
                })
        })?
    };

    let mut used = BTreeSet::new();
    expr.collect_params(&mut used);
    if let Some(unknown) = used.iter().find(|name| !params.contains(*name)) {
        let start = text.find(*unknown).unwrap_or(0);
        return Err(ParseError {
            message: format!("undeclared parameter {}", unknown),
            span: start..start + unknown.len(),
        });
    }

    Ok(QueryTemplate {
        source: text.to_string(),
        params: params.iter().map(|p| p.to_string()).collect(),
        expr,
    })
}

/// Compile user-typed search text with no placeholders
///
/// Empty text selects everything. Failures carry the parser diagnostic.
pub fn compile_query(text: &str) -> Result<Query> {
    let template = compile(text, &[]).map_err(|e| Error::malformed(text, e))?;
    Ok(template.apply(&HashMap::new()))
}

/// Fixed resolution template matching a track by id or by name
pub static ID_OR_NAME: Lazy<QueryTemplate> = Lazy::new(|| {
    compile("Id == $ or Name == $", &["$"]).expect("id-or-name template must compile")
});

/// Bind a user token to the id-or-name template
pub fn id_or_name(token: &str) -> Query {
    let mut values = HashMap::new();
    values.insert("$", token);
    ID_OR_NAME.apply(&values)
}

/// Case-insensitive field lookup that ignores underscores
fn lookup<'a>(entity: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = entity;
    for segment in path {
        let wanted = normalize(segment);
        current = match current {
            Value::Object(map) => map
                .iter()
                .find(|(key, _)| normalize(key) == wanted)
                .map(|(_, v)| v)?,
            _ => return None,
        };
    }
    Some(current)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn compare(field: &Value, op: CmpOp, literal: &Literal) -> bool {
    let ordering = match (field, literal) {
        (Value::String(a), Literal::Str(b)) => Some(a.as_str().cmp(b.as_str())),
        (Value::Number(a), Literal::Num(b)) => a.as_f64().and_then(|a| a.partial_cmp(b)),
        // Numeric fields may be queried with quoted values
        (Value::Number(a), Literal::Str(b)) => match b.parse::<f64>() {
            Ok(b) => a.as_f64().and_then(|a| a.partial_cmp(&b)),
            Err(_) => None,
        },
        (Value::Bool(a), Literal::Bool(b)) => {
            return match op {
                CmpOp::Eq => a == b,
                CmpOp::Ne => a != b,
                _ => false,
            };
        }
        _ => None,
    };
    match ordering {
        Some(ord) => match op {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        },
        None => op == CmpOp::Ne,
    }
}
