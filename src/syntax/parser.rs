use super::lexer::{tokenize_line, Token};
use crate::error::{ExitForgeError, Result};
use crate::types::{BinOp, CmpOp, Expr, Module, Number, Stmt};

/// Parse one strategy module.
///
/// The grammar covers exactly what exit-logic analysis needs: top-level
/// statements, single-level `def` blocks, assignments, `return`, calls,
/// attribute/subscript access, arithmetic, comparisons and `|` chains.
/// Nested blocks (`if`, `for`, inner `def`) are out of scope and rejected.
pub fn parse_module(source: &str) -> Result<Module> {
    let lines: Vec<&str> = source.lines().collect();
    let mut body = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if is_blank(lines[i]) {
            i += 1;
            continue;
        }
        let line_no = i + 1;
        if indent_of(lines[i]) != 0 {
            return Err(ExitForgeError::Parse(format!(
                "line {}: unexpected indentation",
                line_no
            )));
        }
        let tokens = tokenize_line(lines[i], line_no)?;
        if tokens.first() == Some(&Token::Name("def".to_string())) {
            let (name, params) = parse_def_header(&tokens, line_no)?;
            i += 1;
            let mut fn_body = Vec::new();
            let mut body_indent = None;
            while i < lines.len() {
                if is_blank(lines[i]) {
                    i += 1;
                    continue;
                }
                let indent = indent_of(lines[i]);
                if indent == 0 {
                    break;
                }
                let expected = *body_indent.get_or_insert(indent);
                if indent != expected {
                    return Err(ExitForgeError::Parse(format!(
                        "line {}: inconsistent indentation (nested blocks are not supported)",
                        i + 1
                    )));
                }
                let body_tokens = tokenize_line(lines[i], i + 1)?;
                fn_body.push(parse_simple_stmt(&body_tokens, i + 1)?);
                i += 1;
            }
            if fn_body.is_empty() {
                return Err(ExitForgeError::Parse(format!(
                    "line {}: function '{}' has an empty body",
                    line_no, name
                )));
            }
            body.push(Stmt::FunctionDef {
                name,
                params,
                body: fn_body,
            });
        } else {
            body.push(parse_simple_stmt(&tokens, line_no)?);
            i += 1;
        }
    }

    Ok(Module { body })
}

fn is_blank(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn indent_of(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn parse_def_header(tokens: &[Token], line_no: usize) -> Result<(String, Vec<String>)> {
    let mut p = TokenStream::new(tokens, line_no);
    p.expect_name("def")?;
    let name = p.expect_any_name()?;
    p.expect(&Token::LParen)?;
    let mut params = Vec::new();
    if p.peek() != Some(&Token::RParen) {
        loop {
            params.push(p.expect_any_name()?);
            if p.peek() == Some(&Token::Comma) {
                p.advance();
            } else {
                break;
            }
        }
    }
    p.expect(&Token::RParen)?;
    p.expect(&Token::Colon)?;
    p.expect_end()?;
    Ok((name, params))
}

fn parse_simple_stmt(tokens: &[Token], line_no: usize) -> Result<Stmt> {
    if tokens.first() == Some(&Token::Name("return".to_string())) {
        if tokens.len() == 1 {
            return Ok(Stmt::Return { value: None });
        }
        let mut p = TokenStream::new(&tokens[1..], line_no);
        let value = p.parse_expr()?;
        p.expect_end()?;
        return Ok(Stmt::Return { value: Some(value) });
    }

    let mut p = TokenStream::new(tokens, line_no);
    let first = p.parse_expr()?;
    if p.peek() == Some(&Token::Assign) {
        p.advance();
        let value = p.parse_expr()?;
        p.expect_end()?;
        if !is_assignable(&first) {
            return Err(ExitForgeError::Parse(format!(
                "line {}: invalid assignment target",
                line_no
            )));
        }
        Ok(Stmt::Assign {
            target: first,
            value,
        })
    } else {
        p.expect_end()?;
        Ok(Stmt::Expr { value: first })
    }
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. }
    )
}

struct TokenStream<'a> {
    tokens: &'a [Token],
    pos: usize,
    line_no: usize,
}

impl<'a> TokenStream<'a> {
    fn new(tokens: &'a [Token], line_no: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            line_no,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn error(&self, message: &str) -> ExitForgeError {
        ExitForgeError::Parse(format!("line {}: {}", self.line_no, message))
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        let line_no = self.line_no;
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            other => Err(ExitForgeError::Parse(format!(
                "line {}: expected {:?}, found {:?}",
                line_no, expected, other
            ))),
        }
    }

    fn expect_name(&mut self, name: &str) -> Result<()> {
        let line_no = self.line_no;
        match self.advance() {
            Some(Token::Name(n)) if n == name => Ok(()),
            other => Err(ExitForgeError::Parse(format!(
                "line {}: expected '{}', found {:?}",
                line_no, name, other
            ))),
        }
    }

    fn expect_any_name(&mut self) -> Result<String> {
        let line_no = self.line_no;
        match self.advance() {
            Some(Token::Name(n)) => Ok(n.clone()),
            other => Err(ExitForgeError::Parse(format!(
                "line {}: expected identifier, found {:?}",
                line_no, other
            ))),
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(ExitForgeError::Parse(format!(
                "line {}: unexpected trailing token {:?}",
                self.line_no, token
            ))),
        }
    }

    /// Lowest precedence: `|` chains, flattened into a single node.
    fn parse_expr(&mut self) -> Result<Expr> {
        let first = self.parse_comparison()?;
        if self.peek() != Some(&Token::Pipe) {
            return Ok(first);
        }
        let mut operands = vec![first];
        while self.peek() == Some(&Token::Pipe) {
            self.advance();
            operands.push(self.parse_comparison()?);
        }
        Ok(Expr::Or(operands))
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_arith()?;
        let op = match self.peek() {
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::LtE) => CmpOp::LtE,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::GtE) => CmpOp::GtE,
            Some(Token::EqEq) => CmpOp::Eq,
            Some(Token::NotEq) => CmpOp::NotEq,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_arith()?;
        Ok(Expr::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_arith(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_factor()?;
            left = Expr::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::Minus) {
            self.advance();
            // Unary minus is only supported on numeric literals
            return match self.parse_factor()? {
                Expr::Num(Number::Integer(v)) => Ok(Expr::Num(Number::Integer(-v))),
                Expr::Num(Number::Float(v)) => Ok(Expr::Num(Number::Float(-v))),
                _ => Err(self.error("unary minus is only supported on numeric literals")),
            };
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    let attr = self.expect_any_name()?;
                    expr = Expr::Attribute {
                        value: Box::new(expr),
                        attr,
                    };
                }
                Some(Token::LParen) => {
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if self.peek() == Some(&Token::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(&Token::RParen)?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                    };
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&Token::RBracket)?;
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        match self.advance().cloned() {
            Some(Token::Name(name)) => match name.as_str() {
                "True" => Ok(Expr::Bool(true)),
                "False" => Ok(Expr::Bool(false)),
                _ => Ok(Expr::Name(name)),
            },
            Some(Token::Int(v)) => Ok(Expr::Num(Number::Integer(v))),
            Some(Token::Float(v)) => Ok(Expr::Num(Number::Float(v))),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            other => Err(ExitForgeError::Parse(format!(
                "line {}: expected expression, found {:?}",
                self.line_no, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assignment_with_comparison() {
        let module = parse_module("stop_exit = close < entry_price * 0.95").unwrap();
        assert_eq!(module.body.len(), 1);
        let Stmt::Assign { target, value } = &module.body[0] else {
            panic!("expected assignment");
        };
        assert_eq!(*target, Expr::Name("stop_exit".to_string()));
        assert!(matches!(value, Expr::Compare { op: CmpOp::Lt, .. }));
    }

    #[test]
    fn pipe_binds_looser_than_comparison() {
        let module = parse_module("any_exit = stop_exit | close > 1.5").unwrap();
        let Stmt::Assign { value, .. } = &module.body[0] else {
            panic!("expected assignment");
        };
        let Expr::Or(operands) = value else {
            panic!("expected OR chain");
        };
        assert_eq!(operands.len(), 2);
        assert!(matches!(operands[1], Expr::Compare { op: CmpOp::Gt, .. }));
    }

    #[test]
    fn parses_keyed_default_accessor() {
        let module = parse_module("stop_atr_mult = params.get('stop_atr_mult', 2.0)").unwrap();
        let Stmt::Assign { value, .. } = &module.body[0] else {
            panic!("expected assignment");
        };
        let (key, default) = value.keyed_default().unwrap();
        assert_eq!(key, "stop_atr_mult");
        assert!(default.approx_eq(&Number::Float(2.0)));
    }

    #[test]
    fn parses_def_block() {
        let source = "def _apply_exit_strategies(self, df, signals):\n    stop_exit = close < 1.0\n    return signals\n";
        let module = parse_module(source).unwrap();
        let Stmt::FunctionDef { name, params, body } = &module.body[0] else {
            panic!("expected function");
        };
        assert_eq!(name, "_apply_exit_strategies");
        assert_eq!(params, &["self", "df", "signals"]);
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn rejects_nested_blocks() {
        let source = "def f(self):\n    a = 1\n        b = 2\n";
        assert!(parse_module(source).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_module("stop_exit = $$$").is_err());
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let source = "# exit logic\n\nany_exit = stop_exit | profit_exit  # combined\n";
        let module = parse_module(source).unwrap();
        assert_eq!(module.body.len(), 1);
    }
}
