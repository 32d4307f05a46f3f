#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    Word(String),
    Pipe,
    Redirect(RedirectOp),
    End,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectOp {
    Input,  // <
    Output, // >
}

impl RedirectOp {
    /// 重定向目标描述符：输入为 0，输出为 1
    pub fn target_fd(self) -> i32 {
        match self {
            RedirectOp::Input => 0,
            RedirectOp::Output => 1,
        }
    }
}

pub fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0b')
}

pub fn is_symbol(c: char) -> bool {
    matches!(c, '<' | '>' | '|')
}

#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let token = match self.peek_char() {
            None => Token::End,
            Some(c) => match c {
                '|' => {
                    self.read_char();
                    Token::Pipe
                }
                '<' => {
                    self.read_char();
                    Token::Redirect(RedirectOp::Input)
                }
                '>' => {
                    self.read_char();
                    Token::Redirect(RedirectOp::Output)
                }
                _ => self.read_word(),
            },
        };

        // 跳过词法单元后面的空白，保证 rest() 指向下一个单元
        self.skip_whitespace();
        token
    }

    /// 向前看一个词法单元，不移动游标
    pub fn peek_token(&self) -> Token {
        self.clone().next_token()
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn read_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !is_whitespace(c) {
                break;
            }
            self.read_char();
        }
    }

    fn read_word(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if is_whitespace(c) || is_symbol(c) {
                break;
            }
            self.read_char();
        }
        Token::Word(self.input[start..self.pos].to_string())
    }
}

/// 把整行切成词法单元，最后一个总是 `Token::End`
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token == Token::End;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}
