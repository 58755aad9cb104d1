/// Statement lexer - converts statement text into tokens

use super::token::{Token, TokenType};
use crate::error::{QueryError, Result};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.token_type, TokenType::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            self.skip_whitespace();
            if self.current_char() == '-' && self.peek_char() == Some('-') {
                self.skip_line_comment();
            } else if self.current_char() == '/' && self.peek_char() == Some('*') {
                self.skip_block_comment()?;
            } else {
                break;
            }
        }

        let line = self.line;
        let column = self.column;

        if self.is_eof() {
            return Ok(Token::new(TokenType::Eof, line, column));
        }

        let ch = self.current_char();

        let token_type = match ch {
            '\'' | '"' => self.read_string(ch, line, column)?,

            '0'..='9' => self.read_number(),
            '.' if self.peek_char().map_or(false, |c| c.is_ascii_digit()) => self.read_number(),

            c if c.is_alphabetic() || c == '_' => self.read_identifier(),

            '=' => {
                self.advance();
                TokenType::Eq
            }
            '!' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenType::Ne
                } else {
                    TokenType::Unknown('!')
                }
            }
            '<' => {
                self.advance();
                match self.current_char() {
                    '=' => {
                        self.advance();
                        TokenType::Le
                    }
                    '>' => {
                        self.advance();
                        TokenType::Ne
                    }
                    _ => TokenType::Lt,
                }
            }
            '>' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenType::Ge
                } else {
                    TokenType::Gt
                }
            }
            '-' => {
                self.advance();
                TokenType::Minus
            }
            '*' => {
                self.advance();
                TokenType::Star
            }
            '(' => {
                self.advance();
                TokenType::LParen
            }
            ')' => {
                self.advance();
                TokenType::RParen
            }
            ',' => {
                self.advance();
                TokenType::Comma
            }
            ';' => {
                self.advance();
                TokenType::Semicolon
            }
            '.' => {
                self.advance();
                TokenType::Dot
            }
            // Left for the parser: inside WHERE it makes the clause unsupported
            _ => {
                self.advance();
                TokenType::Unknown(ch)
            }
        };

        Ok(Token::new(token_type, line, column))
    }

    fn current_char(&self) -> char {
        if self.is_eof() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            if self.input[self.position] == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.is_eof() && self.current_char() != '\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        self.advance(); // '/'
        self.advance(); // '*'

        while !self.is_eof() {
            if self.current_char() == '*' && self.peek_char() == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(QueryError::Syntax("unterminated block comment".to_string()))
    }

    /// Quoted text; a doubled quote inside stands for one quote character
    fn read_string(&mut self, quote: char, line: usize, column: usize) -> Result<TokenType> {
        self.advance();
        let mut value = String::new();

        loop {
            if self.is_eof() {
                return Err(QueryError::Syntax(format!(
                    "unterminated string starting at line {} column {}",
                    line, column
                )));
            }
            let ch = self.current_char();
            self.advance();
            if ch == quote {
                if self.current_char() == quote {
                    value.push(quote);
                    self.advance();
                    continue;
                }
                break;
            }
            value.push(ch);
        }

        Ok(TokenType::String(value))
    }

    fn read_number(&mut self) -> TokenType {
        let mut value = String::new();
        let mut seen_dot = false;

        while !self.is_eof() {
            let ch = self.current_char();
            if ch.is_ascii_digit() {
                value.push(ch);
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                value.push(ch);
            } else {
                break;
            }
            self.advance();
        }

        // Exponent only when digits follow, so `1e` lexes as `1` then `e`
        if matches!(self.current_char(), 'e' | 'E') {
            let sign = matches!(self.peek_char(), Some('+') | Some('-'));
            let digit_at = self.position + if sign { 2 } else { 1 };
            if self.input.get(digit_at).map_or(false, |c| c.is_ascii_digit()) {
                for _ in 0..(digit_at - self.position) {
                    value.push(self.current_char());
                    self.advance();
                }
                while !self.is_eof() && self.current_char().is_ascii_digit() {
                    value.push(self.current_char());
                    self.advance();
                }
            }
        }

        TokenType::Number(value)
    }

    fn read_identifier(&mut self) -> TokenType {
        let mut value = String::new();

        while !self.is_eof() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        TokenType::from_keyword(&value).unwrap_or(TokenType::Identifier(value))
    }
}
