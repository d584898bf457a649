pub mod lexer;
pub mod parser;
pub mod printer;

pub use parser::parse_module;
pub use printer::{print_expr, print_module, print_stmt};
