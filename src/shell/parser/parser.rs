use log::trace;

use super::ast::{Command, Node, Pipeline, Redirection};
use super::lexer::{Lexer, RedirectOp, Token};
use crate::shell::error::SyntaxError;

pub const DEFAULT_MAX_ARGS: usize = 10;

pub struct Parser<'a> {
    input: &'a str,
    lexer: Lexer<'a>,
    current_token: Token,
    token_start: usize,
    max_args: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_max_args(input, DEFAULT_MAX_ARGS)
    }

    pub fn with_max_args(input: &'a str, max_args: usize) -> Self {
        let mut parser = Parser {
            input,
            lexer: Lexer::new(input),
            current_token: Token::End,
            token_start: 0,
            max_args,
        };
        parser.next_token();
        parser
    }

    fn next_token(&mut self) {
        self.token_start = self.lexer.offset();
        self.current_token = self.lexer.next_token();
    }

    /// line := pipeline，整行必须被完全消费
    pub fn parse_line(&mut self) -> Result<Node, SyntaxError> {
        let node = self.parse_pipeline()?;
        if self.current_token != Token::End {
            let leftover = self.input[self.token_start..].trim();
            return Err(SyntaxError::Leftovers(leftover.to_string()));
        }
        trace!("解析结果: {:?}", node);
        Ok(node)
    }

    /// pipeline := command ('|' pipeline)?，右结合
    fn parse_pipeline(&mut self) -> Result<Node, SyntaxError> {
        let left = self.parse_command()?;
        if self.current_token == Token::Pipe {
            self.next_token();
            let right = self.parse_pipeline()?;
            return Ok(Node::Pipeline(Pipeline::new(left, right)));
        }
        Ok(left)
    }

    /// command := redirs (word redirs)*
    fn parse_command(&mut self) -> Result<Node, SyntaxError> {
        let mut arguments = Vec::new();
        let mut redirections = Vec::new();

        self.parse_redirections(&mut redirections)?;
        loop {
            match &self.current_token {
                Token::End | Token::Pipe => break,
                Token::Word(word) => {
                    if arguments.len() >= self.max_args {
                        return Err(SyntaxError::TooManyArgs { max: self.max_args });
                    }
                    arguments.push(word.clone());
                    self.next_token();
                }
                Token::Redirect(_) => {
                    let near = self.input[self.token_start..].trim();
                    return Err(SyntaxError::UnexpectedToken(near.to_string()));
                }
            }
            self.parse_redirections(&mut redirections)?;
        }

        // 先出现的重定向在最内层
        let node = redirections
            .into_iter()
            .fold(Node::Command(Command::new(arguments)), |inner, (op, file)| {
                Node::Redirect(Redirection::new(op, file, inner))
            });
        Ok(node)
    }

    /// redirs := ('<' word | '>' word)*
    fn parse_redirections(
        &mut self,
        redirections: &mut Vec<(RedirectOp, String)>,
    ) -> Result<(), SyntaxError> {
        while let Token::Redirect(op) = &self.current_token {
            let op = *op;
            self.next_token(); // 跳过重定向操作符

            match &self.current_token {
                Token::Word(filename) => {
                    redirections.push((op, filename.clone()));
                    self.next_token();
                }
                _ => return Err(SyntaxError::MissingRedirectTarget),
            }
        }
        Ok(())
    }
}

pub fn parse_line(input: &str, max_args: usize) -> Result<Node, SyntaxError> {
    Parser::with_max_args(input, max_args).parse_line()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(args: &[&str]) -> Node {
        Node::Command(Command::new(args.iter().map(|s| s.to_string()).collect()))
    }

    fn redirect(op: RedirectOp, file: &str, inner: Node) -> Node {
        Node::Redirect(Redirection::new(op, file.to_string(), inner))
    }

    fn pipe(left: Node, right: Node) -> Node {
        Node::Pipeline(Pipeline::new(left, right))
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_simple_command() {
        let node = Parser::new("ls -l").parse_line().unwrap();
        assert_eq!(node, cmd(&["ls", "-l"]));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_empty_line() {
        assert_eq!(Parser::new("").parse_line().unwrap(), cmd(&[]));
        assert_eq!(Parser::new(" \t\n").parse_line().unwrap(), cmd(&[]));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_pipeline_is_right_associative() {
        let node = Parser::new("a | b | c").parse_line().unwrap();
        assert_eq!(node, pipe(cmd(&["a"]), pipe(cmd(&["b"]), cmd(&["c"]))));
        assert_eq!(node.stages(), 3);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_output_redirection() {
        let node = Parser::new("cat f.txt > out.txt").parse_line().unwrap();
        match &node {
            Node::Redirect(redirection) => {
                assert_eq!(redirection.operator, RedirectOp::Output);
                assert_eq!(redirection.target_fd(), 1);
                assert_eq!(redirection.filename, "out.txt");
                assert_eq!(*redirection.inner, cmd(&["cat", "f.txt"]));
            }
            _ => panic!("Expected redirection"),
        }
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirections_nest_in_order() {
        let node = Parser::new("< in sort -r > out").parse_line().unwrap();
        assert_eq!(
            node,
            redirect(
                RedirectOp::Output,
                "out",
                redirect(RedirectOp::Input, "in", cmd(&["sort", "-r"])),
            )
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_words_after_redirection_join_the_command() {
        let node = Parser::new("echo a > f b").parse_line().unwrap();
        assert_eq!(node, redirect(RedirectOp::Output, "f", cmd(&["echo", "a", "b"])));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirections_inside_pipeline() {
        let node = Parser::new("cat < in | wc -l > out").parse_line().unwrap();
        assert_eq!(
            node,
            pipe(
                redirect(RedirectOp::Input, "in", cmd(&["cat"])),
                redirect(RedirectOp::Output, "out", cmd(&["wc", "-l"])),
            )
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirection_without_command() {
        let node = Parser::new("> out").parse_line().unwrap();
        assert_eq!(node, redirect(RedirectOp::Output, "out", cmd(&[])));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_trailing_pipe_gives_empty_right_side() {
        let node = Parser::new("ls |").parse_line().unwrap();
        assert_eq!(node, pipe(cmd(&["ls"]), cmd(&[])));
    }

    #[test]
    fn test_missing_redirection_target() {
        assert_eq!(
            Parser::new("cat >").parse_line(),
            Err(SyntaxError::MissingRedirectTarget)
        );
        assert_eq!(
            Parser::new("cat < | wc").parse_line(),
            Err(SyntaxError::MissingRedirectTarget)
        );
        assert_eq!(
            Parser::new("echo >> f").parse_line(),
            Err(SyntaxError::MissingRedirectTarget)
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_argument_capacity() {
        let at_capacity = vec!["w"; 4].join(" ");
        assert!(parse_line(&at_capacity, 4).is_ok());

        let over = vec!["w"; 5].join(" ");
        assert_eq!(
            parse_line(&over, 4),
            Err(SyntaxError::TooManyArgs { max: 4 })
        );

        let default_over = vec!["w"; DEFAULT_MAX_ARGS + 1].join(" ");
        assert!(Parser::new(&default_over).parse_line().is_err());
        // 上限按单个命令计算
        let per_stage = format!("{} | {}", at_capacity, at_capacity);
        assert_eq!(parse_line(&per_stage, 4).unwrap().stages(), 2);
    }
}
