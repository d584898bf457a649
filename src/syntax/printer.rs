use crate::types::{Expr, Module, Stmt};

const PREC_OR: u8 = 1;
const PREC_CMP: u8 = 2;
const PREC_ADD: u8 = 3;
const PREC_MUL: u8 = 4;
const PREC_ATOM: u8 = 5;

/// Print a module in canonical form: four-space indents, single spaces
/// around binary operators, single-quoted strings. Parsing the output
/// yields the same tree back.
pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    for stmt in &module.body {
        print_stmt(stmt, 0, &mut out);
    }
    out
}

pub fn print_stmt(stmt: &Stmt, indent: usize, out: &mut String) {
    let pad = "    ".repeat(indent);
    match stmt {
        Stmt::Assign { target, value } => {
            out.push_str(&format!("{}{} = {}\n", pad, print_expr(target), print_expr(value)));
        }
        Stmt::Return { value: Some(value) } => {
            out.push_str(&format!("{}return {}\n", pad, print_expr(value)));
        }
        Stmt::Return { value: None } => {
            out.push_str(&format!("{}return\n", pad));
        }
        Stmt::Expr { value } => {
            out.push_str(&format!("{}{}\n", pad, print_expr(value)));
        }
        Stmt::FunctionDef { name, params, body } => {
            out.push_str(&format!("{}def {}({}):\n", pad, name, params.join(", ")));
            for inner in body {
                print_stmt(inner, indent + 1, out);
            }
        }
    }
}

pub fn print_expr(expr: &Expr) -> String {
    render(expr, 0)
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Or(_) => PREC_OR,
        Expr::Compare { .. } => PREC_CMP,
        Expr::BinOp { op, .. } => match op {
            crate::types::BinOp::Add | crate::types::BinOp::Sub => PREC_ADD,
            crate::types::BinOp::Mul | crate::types::BinOp::Div => PREC_MUL,
        },
        _ => PREC_ATOM,
    }
}

fn render(expr: &Expr, min_prec: u8) -> String {
    let prec = precedence(expr);
    let text = match expr {
        Expr::Name(name) => name.clone(),
        Expr::Num(number) => number.to_string(),
        Expr::Str(s) => format!("'{}'", s),
        Expr::Bool(true) => "True".to_string(),
        Expr::Bool(false) => "False".to_string(),
        Expr::Attribute { value, attr } => {
            format!("{}.{}", render(value, PREC_ATOM), attr)
        }
        Expr::Subscript { value, index } => {
            format!("{}[{}]", render(value, PREC_ATOM), render(index, 0))
        }
        Expr::Call { func, args } => {
            let rendered: Vec<String> = args.iter().map(|arg| render(arg, 0)).collect();
            format!("{}({})", render(func, PREC_ATOM), rendered.join(", "))
        }
        Expr::Compare { left, op, right } => format!(
            "{} {} {}",
            render(left, PREC_CMP + 1),
            op.as_str(),
            render(right, PREC_CMP + 1)
        ),
        Expr::BinOp { left, op, right } => format!(
            "{} {} {}",
            render(left, prec),
            op.as_str(),
            render(right, prec + 1)
        ),
        Expr::Or(operands) => {
            let rendered: Vec<String> =
                operands.iter().map(|operand| render(operand, PREC_OR + 1)).collect();
            rendered.join(" | ")
        }
    };
    if prec < min_prec {
        format!("({})", text)
    } else {
        text
    }
}
