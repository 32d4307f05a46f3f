pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

pub use ast::{Command, Node, Pipeline, Redirection};
pub use lexer::{tokenize, Lexer, RedirectOp, Token};
pub use parser::{parse_line, Parser, DEFAULT_MAX_ARGS};
