use crate::{
    error::SyntaxError,
    token::{Position, Token, TokenKind},
};

/// Lexes the whole source, always ending the stream with a single `Eof` token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.is(TokenKind::Eof);
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    char: Option<char>,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let char = chars.first().copied();
        Self {
            chars,
            position: 0,
            char,
            line: 1,
            column: 1,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_whitespace_and_comments()?;

        let start = Position::new(self.line, self.column);
        let char = match self.char {
            Some(char) => char,
            None => return Ok(Token::new(TokenKind::Eof, "", start)),
        };

        let kind = match char {
            '=' if self.is_next_char('=') => self.two_char(TokenKind::Eq),
            '=' => TokenKind::Assign,
            '!' if self.is_next_char('=') => self.two_char(TokenKind::NotEq),
            '!' => TokenKind::Bang,
            '<' if self.is_next_char('=') => self.two_char(TokenKind::LtEq),
            '<' => TokenKind::Lt,
            '>' if self.is_next_char('=') => self.two_char(TokenKind::GtEq),
            '>' => TokenKind::Gt,
            '+' if self.is_next_char('+') => self.two_char(TokenKind::Increment),
            '+' if self.is_next_char('=') => self.two_char(TokenKind::PlusAssign),
            '+' => TokenKind::Plus,
            '-' if self.is_next_char('-') => self.two_char(TokenKind::Decrement),
            '-' if self.is_next_char('=') => self.two_char(TokenKind::MinusAssign),
            '-' => TokenKind::Minus,
            '&' if self.is_next_char('&') => self.two_char(TokenKind::And),
            '|' if self.is_next_char('|') => self.two_char(TokenKind::Or),
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '(' => TokenKind::Lparen,
            ')' => TokenKind::Rparen,
            '{' => TokenKind::Lbrace,
            '}' => TokenKind::Rbrace,
            '[' => TokenKind::Lbracket,
            ']' => TokenKind::Rbracket,
            '"' | '\'' => {
                self.read_char();
                let literal = self.read_until(|c| c == char);
                if self.char != Some(char) {
                    return Err(SyntaxError::UnterminatedString { position: start });
                }
                self.read_char();
                return Ok(Token::new(TokenKind::String, literal, start));
            }
            _ if char.is_ascii_digit() => {
                let mut literal = self.read_until(|c| !c.is_ascii_digit());
                let is_decimal = self.char == Some('.')
                    && self
                        .chars
                        .get(self.position + 1)
                        .is_some_and(|c| c.is_ascii_digit());
                if is_decimal {
                    self.read_char();
                    literal.push('.');
                    literal.push_str(&self.read_until(|c| !c.is_ascii_digit()));
                    return Ok(Token::new(TokenKind::Float, literal, start));
                }
                return Ok(Token::new(TokenKind::Int, literal, start));
            }
            _ if char.is_alphabetic() || char == '_' => {
                let literal = self.read_until(|c| !c.is_alphanumeric() && c != '_');
                let kind = TokenKind::keyword(&literal).unwrap_or(TokenKind::Ident);
                return Ok(Token::new(kind, literal, start));
            }
            _ => TokenKind::Illegal,
        };

        let lexeme = match kind {
            TokenKind::Illegal => char.to_string(),
            _ => kind.to_string(),
        };
        self.read_char();

        Ok(Token::new(kind, lexeme, start))
    }

    fn read_char(&mut self) {
        if self.char == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else if self.char.is_some() {
            self.column += 1;
        }
        self.position += 1;
        self.char = self.chars.get(self.position).copied();
    }

    fn two_char(&mut self, kind: TokenKind) -> TokenKind {
        self.read_char();
        kind
    }

    fn is_next_char(&self, ch: char) -> bool {
        self.chars.get(self.position + 1).eq(&Some(&ch))
    }

    /// Consumes characters until `condition` holds, leaving the lexer on the stopping character.
    fn read_until(&mut self, condition: impl Fn(char) -> bool) -> String {
        let mut literal = String::new();
        while let Some(char) = self.char {
            if condition(char) {
                break;
            }
            literal.push(char);
            self.read_char();
        }
        literal
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), SyntaxError> {
        loop {
            while self.char.is_some_and(|char| char.is_whitespace()) {
                self.read_char();
            }
            match (self.char, self.chars.get(self.position + 1)) {
                (Some('/'), Some('/')) => {
                    self.read_until(|c| c == '\n');
                }
                (Some('/'), Some('*')) => {
                    let start = Position::new(self.line, self.column);
                    self.read_char();
                    self.read_char();
                    while self.char.is_some() && !(self.char == Some('*') && self.is_next_char('/'))
                    {
                        self.read_char();
                    }
                    if self.char.is_none() {
                        return Err(SyntaxError::UnterminatedComment { position: start });
                    }
                    self.read_char();
                    self.read_char();
                }
                _ => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::PrimitiveType;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_lexer() {
        let input = r#"
                    public static int add(int x, int y) {
                        return x + y;
                    }
                    String name = "World";
                    double ratio = 2.5;
                    for (int i = 0; i <= 10; i++) { i += 2; i--; }
                    if (a == b) { } else { }
                    a != b; a < b; a > b; a >= b;
                    System.out.println('single');
                    boolean done = true && !false || x;
                    import math.sqrt;
                    "#;

        let mut expected = vec![
            TokenKind::Public,
            TokenKind::Static,
            TokenKind::Type(PrimitiveType::Int),
            TokenKind::Ident,
            TokenKind::Lparen,
            TokenKind::Type(PrimitiveType::Int),
            TokenKind::Ident,
            TokenKind::Comma,
            TokenKind::Type(PrimitiveType::Int),
            TokenKind::Ident,
            TokenKind::Rparen,
            TokenKind::Lbrace,
            TokenKind::Return,
            TokenKind::Ident,
            TokenKind::Plus,
            TokenKind::Ident,
            TokenKind::Semicolon,
            TokenKind::Rbrace,
            TokenKind::Type(PrimitiveType::String),
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::String,
            TokenKind::Semicolon,
            TokenKind::Type(PrimitiveType::Double),
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::Float,
            TokenKind::Semicolon,
            TokenKind::For,
            TokenKind::Lparen,
            TokenKind::Type(PrimitiveType::Int),
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::Int,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::LtEq,
            TokenKind::Int,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::Increment,
            TokenKind::Rparen,
            TokenKind::Lbrace,
            TokenKind::Ident,
            TokenKind::PlusAssign,
            TokenKind::Int,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::Decrement,
            TokenKind::Semicolon,
            TokenKind::Rbrace,
            TokenKind::If,
            TokenKind::Lparen,
            TokenKind::Ident,
            TokenKind::Eq,
            TokenKind::Ident,
            TokenKind::Rparen,
            TokenKind::Lbrace,
            TokenKind::Rbrace,
            TokenKind::Else,
            TokenKind::Lbrace,
            TokenKind::Rbrace,
            TokenKind::Ident,
            TokenKind::NotEq,
            TokenKind::Ident,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::Lt,
            TokenKind::Ident,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::Gt,
            TokenKind::Ident,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::GtEq,
            TokenKind::Ident,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::Dot,
            TokenKind::Ident,
            TokenKind::Dot,
            TokenKind::Ident,
            TokenKind::Lparen,
            TokenKind::String,
            TokenKind::Rparen,
            TokenKind::Semicolon,
            TokenKind::Type(PrimitiveType::Boolean),
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::True,
            TokenKind::And,
            TokenKind::Bang,
            TokenKind::False,
            TokenKind::Or,
            TokenKind::Ident,
            TokenKind::Semicolon,
            TokenKind::Import,
            TokenKind::Ident,
            TokenKind::Dot,
            TokenKind::Ident,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
        .into_iter();

        for kind in kinds(input) {
            let expected_kind = expected.next().unwrap();
            assert_eq!(kind, expected_kind);
        }
        assert!(expected.next().is_none());
    }

    #[test]
    fn test_literals_and_positions() {
        let tokens = tokenize("int x = 42;\n  String s = 'a \"b\" c';").unwrap();

        assert_eq!(tokens[3].lexeme, "42");
        assert_eq!(tokens[3].position, Position::new(1, 9));
        assert_eq!(tokens[3].kind, TokenKind::Int);

        assert_eq!(tokens[5].kind, TokenKind::Type(PrimitiveType::String));
        assert_eq!(tokens[5].position, Position::new(2, 3));

        assert_eq!(tokens[8].kind, TokenKind::String);
        assert_eq!(tokens[8].lexeme, "a \"b\" c");
    }

    #[test]
    fn test_braces_inside_strings_stay_literal() {
        let tokens = tokenize(r#"println("}{");"#).unwrap();
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(tokens[2].lexeme, "}{");
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_comments_are_skipped() {
        let input = r#"
            // a line comment with "quotes
            int x = 1; /* block
            comment */ x++;
        "#;
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::Type(PrimitiveType::Int),
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Increment,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_number_followed_by_dot_is_not_decimal() {
        let tokens = tokenize("3.x 3.25").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[1].kind, TokenKind::Dot);
        assert_eq!(tokens[3].kind, TokenKind::Float);
        assert_eq!(tokens[3].lexeme, "3.25");
    }

    #[test]
    fn test_unterminated_string() {
        let cases = vec![
            ("String s = \"oops;", Position::new(1, 12)),
            ("int x = 1;\nprintln('never closed);", Position::new(2, 9)),
            ("\"mixed'", Position::new(1, 1)),
        ];
        for (input, position) in cases {
            match tokenize(input) {
                Err(SyntaxError::UnterminatedString { position: found }) => {
                    assert_eq!(found, position)
                }
                other => panic!("expected unterminated string for {input}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unterminated_block_comment() {
        let cases = vec![
            ("int x = 1; /* never closed", Position::new(1, 12)),
            ("/* one */
  /* two *", Position::new(2, 3)),
            ("/*", Position::new(1, 1)),
        ];
        for (input, position) in cases {
            match tokenize(input) {
                Err(SyntaxError::UnterminatedComment { position: found }) => {
                    assert_eq!(found, position)
                }
                other => panic!("expected unterminated comment for {input}, got {other:?}"),
            }
        }
        assert_eq!(kinds("/**/ x"), vec![TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn test_illegal_characters_become_tokens() {
        let tokens = tokenize("a # b").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Illegal);
        assert_eq!(tokens[1].lexeme, "#");
    }
}
