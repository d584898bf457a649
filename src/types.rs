use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric literal in strategy source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(v) => *v as f64,
            Number::Float(v) => *v,
        }
    }

    /// Numeric equality across the Integer/Float split.
    pub fn approx_eq(&self, other: &Number) -> bool {
        (self.as_f64() - other.as_f64()).abs() < 1e-12
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(v) => write!(f, "{}", v),
            Number::Float(v) => {
                // Keep the decimal point so 2.0 round-trips as 2.0, not 2
                if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Lt,
    LtE,
    Gt,
    GtE,
    Eq,
    NotEq,
}

impl CmpOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
        }
    }

    /// Strict/inclusive partner with the same direction.
    ///
    /// `<` is never turned into `>` (and vice versa) so an exit condition
    /// can never be silently inverted. Equality operators have no partner.
    pub fn direction_preserving_swap(&self) -> Option<CmpOp> {
        match self {
            CmpOp::Lt => Some(CmpOp::LtE),
            CmpOp::LtE => Some(CmpOp::Lt),
            CmpOp::Gt => Some(CmpOp::GtE),
            CmpOp::GtE => Some(CmpOp::Gt),
            CmpOp::Eq | CmpOp::NotEq => None,
        }
    }
}

/// Arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }
}

/// Expression node of the strategy dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Name(String),
    Num(Number),
    Str(String),
    Bool(bool),
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Compare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// Flattened `|` chain used to combine exit signals.
    Or(Vec<Expr>),
}

impl Expr {
    /// Visit this expression and every sub-expression, outermost first.
    pub fn for_each<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::Attribute { value, .. } => value.for_each(f),
            Expr::Subscript { value, index } => {
                value.for_each(f);
                index.for_each(f);
            }
            Expr::Call { func, args } => {
                func.for_each(f);
                for arg in args {
                    arg.for_each(f);
                }
            }
            Expr::Compare { left, right, .. } | Expr::BinOp { left, right, .. } => {
                left.for_each(f);
                right.for_each(f);
            }
            Expr::Or(operands) => {
                for operand in operands {
                    operand.for_each(f);
                }
            }
            Expr::Name(_) | Expr::Num(_) | Expr::Str(_) | Expr::Bool(_) => {}
        }
    }

    /// Matches the keyed-default accessor shape `params.get('<key>', <literal>)`.
    ///
    /// Only fully literal key/default pairs are recognized; anything else
    /// returns `None` rather than an error.
    pub fn keyed_default(&self) -> Option<(&str, Number)> {
        let Expr::Call { func, args } = self else {
            return None;
        };
        let Expr::Attribute { value, attr } = func.as_ref() else {
            return None;
        };
        if attr != "get" || !matches!(value.as_ref(), Expr::Name(base) if base == "params") {
            return None;
        }
        if let [Expr::Str(key), Expr::Num(default)] = args.as_slice() {
            Some((key.as_str(), *default))
        } else {
            None
        }
    }
}

/// Statement node of the strategy dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Assign {
        target: Expr,
        value: Expr,
    },
    Return {
        value: Option<Expr>,
    },
    Expr {
        value: Expr,
    },
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
}

impl Stmt {
    /// Expressions directly held by this statement (targets included).
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            Stmt::Assign { target, value } => vec![target, value],
            Stmt::Return { value } => value.iter().collect(),
            Stmt::Expr { value } => vec![value],
            Stmt::FunctionDef { .. } => vec![],
        }
    }
}

/// One parsed strategy module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    /// Visit every statement in the module, including function bodies.
    pub fn for_each_stmt<'a>(&'a self, f: &mut impl FnMut(&'a Stmt)) {
        fn walk<'a>(stmts: &'a [Stmt], f: &mut impl FnMut(&'a Stmt)) {
            for stmt in stmts {
                f(stmt);
                if let Stmt::FunctionDef { body, .. } = stmt {
                    walk(body, f);
                }
            }
        }
        walk(&self.body, f);
    }

    /// Visit every expression in the module.
    pub fn for_each_expr<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        self.for_each_stmt(&mut |stmt| {
            for expr in stmt.exprs() {
                expr.for_each(f);
            }
        });
    }

    /// Find a top-level function definition by name.
    pub fn find_function(&self, name: &str) -> Option<&Stmt> {
        self.body
            .iter()
            .find(|stmt| matches!(stmt, Stmt::FunctionDef { name: n, .. } if n == name))
    }
}
