// SQL Lexer
use super::EngineError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Create,
    Drop,
    Table,
    If,
    Exists,
    As,
    And,
    Or,
    Not,
    Is,
    Null,
    True,
    False,
    Limit,
    Offset,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    // Delimiters
    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Dot,

    // Literals
    IntegerLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    Identifier(String),
    /// `?` has no number, `$n` carries n
    Placeholder(Option<usize>),

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(s) => write!(f, "Identifier({})", s),
            Token::IntegerLiteral(n) => write!(f, "Integer({})", n),
            Token::FloatLiteral(n) => write!(f, "Float({})", n),
            Token::StringLiteral(s) => write!(f, "String('{}')", s),
            Token::Placeholder(None) => write!(f, "?"),
            Token::Placeholder(Some(n)) => write!(f, "${}", n),
            _ => write!(f, "{:?}", self),
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Lexer {
            input: chars,
            position: 0,
            current_char,
        }
    }

    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Result<Token, EngineError> {
        let mut num_str = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else if (ch == '.' && !is_float) || ((ch == 'e' || ch == 'E') && !num_str.contains(['e', 'E'])) {
                is_float = true;
                num_str.push(ch);
                self.advance();
                if matches!(self.current_char, Some('+') | Some('-')) && num_str.ends_with(['e', 'E']) {
                    if let Some(sign) = self.current_char {
                        num_str.push(sign);
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }

        let invalid = || EngineError::Parse(format!("invalid number literal {}", num_str));
        if is_float {
            num_str.parse().map(Token::FloatLiteral).map_err(|_| invalid())
        } else {
            num_str.parse().map(Token::IntegerLiteral).map_err(|_| invalid())
        }
    }

    /// Read a quoted run; a doubled quote stands for itself
    fn read_quoted(&mut self, quote: char) -> Result<String, EngineError> {
        let mut text = String::new();
        self.advance(); // Skip opening quote

        loop {
            match self.current_char {
                None => {
                    return Err(EngineError::Parse(format!(
                        "unterminated {} quoted text",
                        quote
                    )))
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    if self.current_char == Some(quote) {
                        text.push(quote);
                        self.advance();
                    } else {
                        return Ok(text);
                    }
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.to_uppercase().as_str() {
            "SELECT" => Token::Select,
            "FROM" => Token::From,
            "WHERE" => Token::Where,
            "INSERT" => Token::Insert,
            "INTO" => Token::Into,
            "VALUES" => Token::Values,
            "CREATE" => Token::Create,
            "DROP" => Token::Drop,
            "TABLE" => Token::Table,
            "IF" => Token::If,
            "EXISTS" => Token::Exists,
            "AS" => Token::As,
            "AND" => Token::And,
            "OR" => Token::Or,
            "NOT" => Token::Not,
            "IS" => Token::Is,
            "NULL" => Token::Null,
            "TRUE" => Token::True,
            "FALSE" => Token::False,
            "LIMIT" => Token::Limit,
            "OFFSET" => Token::Offset,
            _ => Token::Identifier(ident),
        }
    }

    fn read_numbered_placeholder(&mut self) -> Result<Token, EngineError> {
        self.advance(); // Skip '$'
        let mut digits = String::new();
        while let Some(ch) = self.current_char.filter(|c| c.is_ascii_digit()) {
            digits.push(ch);
            self.advance();
        }
        match digits.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Token::Placeholder(Some(n))),
            _ => Err(EngineError::Parse(format!("invalid placeholder ${}", digits))),
        }
    }

    fn single(&mut self, token: Token) -> Result<Token, EngineError> {
        self.advance();
        Ok(token)
    }

    pub fn next_token(&mut self) -> Result<Token, EngineError> {
        self.skip_whitespace();

        let Some(ch) = self.current_char else {
            return Ok(Token::Eof);
        };
        match ch {
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '%' => self.single(Token::Percent),
            '=' => self.single(Token::Equal),
            '?' => self.single(Token::Placeholder(None)),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            ',' => self.single(Token::Comma),
            ';' => self.single(Token::Semicolon),
            '.' => self.single(Token::Dot),
            '<' => {
                self.advance();
                match self.current_char {
                    Some('=') => self.single(Token::LessEqual),
                    Some('>') => self.single(Token::NotEqual),
                    _ => Ok(Token::Less),
                }
            }
            '>' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.single(Token::GreaterEqual)
                } else {
                    Ok(Token::Greater)
                }
            }
            '!' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.single(Token::NotEqual)
                } else {
                    Err(EngineError::Parse("unexpected character '!'".to_string()))
                }
            }
            '$' => self.read_numbered_placeholder(),
            '\'' => self.read_quoted('\'').map(Token::StringLiteral),
            '"' => self.read_quoted('"').map(Token::Identifier),
            _ if ch.is_ascii_digit() => self.read_number(),
            _ if ch.is_alphabetic() || ch == '_' => Ok(self.read_identifier()),
            _ => Err(EngineError::Parse(format!("unexpected character '{}'", ch))),
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, EngineError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }

        Ok(tokens)
    }
}
