use std::rc::Rc;

use crate::{
    ast::{
        AssignOperator, Expression, Import, Literal, MethodDecl, Operator, Parameter, Program,
        Statement, TypeName, UpdateOperator,
    },
    error::SyntaxError,
    token::{Token, TokenKind},
};

type Result<T> = std::result::Result<T, SyntaxError>;

/// Deepest combined nesting of blocks and sub-expressions the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialOrd, PartialEq, Eq, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Index,
}

impl Precedence {
    fn from_token(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Or => Precedence::Or,
            TokenKind::And => Precedence::And,
            TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
            TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => {
                Precedence::LessGreater
            }
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
            TokenKind::Lbracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

/// Recursive-descent parser over a token stream produced by [`crate::lexer::tokenize`].
///
/// Every `parse_*` method starts with the current token on the first token of its
/// construct and returns with the current token on the construct's last token.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|token| token.is(TokenKind::Eof)) {
            let position = tokens
                .last()
                .map(|token| token.position)
                .unwrap_or(crate::token::Position::new(1, 1));
            tokens.push(Token::new(TokenKind::Eof, "", position));
        }
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    pub fn parse_program(&mut self) -> Result<Program> {
        let mut statements: Vec<Statement> = Vec::new();
        while !self.cur_is(TokenKind::Eof) {
            let statement = self.parse_statement()?;
            statements.push(statement);
            self.next_token();
        }
        Ok(Program { statements })
    }

    fn token_at(&self, offset: usize) -> &Token {
        let index = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn cur_token(&self) -> &Token {
        self.token_at(0)
    }

    fn peek_token(&self) -> &Token {
        self.token_at(1)
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur_token().is(kind)
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek_token().is(kind)
    }

    fn next_token(&mut self) -> &mut Self {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
        self
    }

    fn peek_precedence(&self) -> Precedence {
        Precedence::from_token(self.peek_token().kind)
    }

    fn cur_precedence(&self) -> Precedence {
        Precedence::from_token(self.cur_token().kind)
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(SyntaxError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
                position: self.cur_token().position,
            });
        }
        Ok(())
    }

    fn expect_peek(&mut self, exp_token: TokenKind) -> Result<()> {
        if self.peek_is(exp_token) {
            self.next_token();
            Ok(())
        } else {
            Err(expected(exp_token.to_string(), self.peek_token()))
        }
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.cur_token().kind {
            kind if kind.is_modifier() => self.parse_declaration(),
            TokenKind::Class | TokenKind::Void => self.parse_declaration(),
            TokenKind::Type(_) if self.is_method_signature() => self.parse_declaration(),
            TokenKind::Type(_) => self.parse_var_declaration(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Import => self.parse_import_statement(),
            TokenKind::Ident if self.is_print_call() => self.parse_print_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    /// `type ([])* name (` starting at the current token.
    fn is_method_signature(&self) -> bool {
        let mut offset = 1;
        while self.token_at(offset).is(TokenKind::Lbracket)
            && self.token_at(offset + 1).is(TokenKind::Rbracket)
        {
            offset += 2;
        }
        self.token_at(offset).is(TokenKind::Ident) && self.token_at(offset + 1).is(TokenKind::Lparen)
    }

    fn starts_declaration(&self) -> bool {
        let kind = self.cur_token().kind;
        kind.is_modifier()
            || matches!(kind, TokenKind::Class | TokenKind::Void)
            || (matches!(kind, TokenKind::Type(_)) && self.is_method_signature())
    }

    fn is_print_call(&self) -> bool {
        let name = self.cur_token().lexeme.as_str();
        if name == "println" {
            return self.peek_is(TokenKind::Lparen);
        }
        name == "System"
            && self.token_at(1).is(TokenKind::Dot)
            && self.token_at(2).lexeme == "out"
            && self.token_at(3).is(TokenKind::Dot)
            && self.token_at(4).lexeme == "println"
    }

    fn parse_declaration(&mut self) -> Result<Statement> {
        let position = self.cur_token().position;
        let mut is_static = false;
        while self.cur_token().kind.is_modifier() {
            is_static |= self.cur_is(TokenKind::Static);
            self.next_token();
        }

        if self.cur_is(TokenKind::Class) {
            return self.parse_class_declaration();
        }

        let ty = self.parse_type()?;
        self.expect_peek(TokenKind::Ident)?;
        let name = self.cur_token().lexeme.clone();

        match self.peek_token().kind {
            TokenKind::Lparen => self.parse_method_declaration(ty, name, is_static, position),
            TokenKind::Assign if ty != TypeName::Void => self.parse_var_initializer(ty, name),
            _ => Err(expected("(".to_string(), self.peek_token())),
        }
    }

    fn parse_class_declaration(&mut self) -> Result<Statement> {
        self.expect_peek(TokenKind::Ident)?;
        let name = self.cur_token().lexeme.clone();
        self.expect_peek(TokenKind::Lbrace)?;
        self.next_token();

        let mut members: Vec<Statement> = Vec::new();
        while !self.cur_is(TokenKind::Rbrace) {
            let is_member = self.starts_declaration() || matches!(self.cur_token().kind, TokenKind::Type(_));
            if !is_member {
                return Err(unexpected(self.cur_token()));
            }
            members.push(self.parse_statement()?);
            self.next_token();
        }

        Ok(Statement::Class { name, members })
    }

    fn parse_method_declaration(
        &mut self,
        return_type: TypeName,
        name: String,
        is_static: bool,
        position: crate::token::Position,
    ) -> Result<Statement> {
        self.expect_peek(TokenKind::Lparen)?;
        let parameters = self.parse_parameters()?;
        self.expect_peek(TokenKind::Lbrace)?;
        let body = self.parse_block_statement()?;

        Ok(Statement::MethodDecl(Rc::new(MethodDecl {
            name,
            parameters,
            return_type,
            is_static,
            body,
            position,
        })))
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>> {
        let mut parameters: Vec<Parameter> = Vec::new();

        if self.peek_is(TokenKind::Rparen) {
            self.next_token();
            return Ok(parameters);
        }

        loop {
            self.next_token();
            let ty = self.parse_type()?;
            self.expect_peek(TokenKind::Ident)?;
            parameters.push(Parameter {
                ty,
                name: self.cur_token().lexeme.clone(),
            });
            if !self.peek_is(TokenKind::Comma) {
                break;
            }
            self.next_token();
        }

        self.expect_peek(TokenKind::Rparen)?;

        Ok(parameters)
    }

    fn parse_type(&mut self) -> Result<TypeName> {
        let mut ty = match self.cur_token().kind {
            TokenKind::Type(primitive) => TypeName::Primitive(primitive),
            TokenKind::Void => TypeName::Void,
            _ => return Err(expected("type".to_string(), self.cur_token())),
        };
        while self.peek_is(TokenKind::Lbracket) && self.token_at(2).is(TokenKind::Rbracket) {
            self.next_token().next_token();
            ty = TypeName::Array(Box::new(ty));
        }
        Ok(ty)
    }

    fn parse_var_declaration(&mut self) -> Result<Statement> {
        let ty = self.parse_type()?;
        self.expect_peek(TokenKind::Ident)?;
        let name = self.cur_token().lexeme.clone();
        self.parse_var_initializer(ty, name)
    }

    fn parse_var_initializer(&mut self, ty: TypeName, name: String) -> Result<Statement> {
        self.expect_peek(TokenKind::Assign)?;
        self.next_token();

        let value = if self.cur_is(TokenKind::Lbrace) {
            Expression::Array(self.parse_expression_list(TokenKind::Rbrace)?)
        } else {
            self.parse_expression(Precedence::Lowest)?
        };

        self.expect_peek(TokenKind::Semicolon)?;

        Ok(Statement::VarDecl { ty, name, value })
    }

    fn parse_print_statement(&mut self) -> Result<Statement> {
        if self.cur_token().lexeme == "System" {
            self.next_token().next_token().next_token().next_token();
        }
        self.expect_peek(TokenKind::Lparen)?;

        let value = if self.peek_is(TokenKind::Rparen) {
            None
        } else {
            self.next_token();
            Some(self.parse_expression(Precedence::Lowest)?)
        };

        self.expect_peek(TokenKind::Rparen)?;
        self.expect_peek(TokenKind::Semicolon)?;

        Ok(Statement::Print(value))
    }

    fn parse_if_statement(&mut self) -> Result<Statement> {
        self.expect_peek(TokenKind::Lparen)?;

        self.next_token();

        let condition = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::Rparen)?;

        self.expect_peek(TokenKind::Lbrace)?;

        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();
            if self.peek_is(TokenKind::If) {
                self.next_token();
                Some(vec![self.parse_if_statement()?])
            } else {
                self.expect_peek(TokenKind::Lbrace)?;
                Some(self.parse_block_statement()?)
            }
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            consequence,
            alternative,
        })
    }

    fn parse_for_statement(&mut self) -> Result<Statement> {
        self.expect_peek(TokenKind::Lparen)?;
        self.next_token();

        let init = match self.cur_token().kind {
            TokenKind::Type(_) => self.parse_var_declaration()?,
            _ => self.parse_expression_statement()?,
        };

        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::Semicolon)?;

        self.next_token();
        let increment = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::Rparen)?;

        self.expect_peek(TokenKind::Lbrace)?;
        let body = self.parse_block_statement()?;

        Ok(Statement::For {
            init: Box::new(init),
            condition,
            increment,
            body,
        })
    }

    fn parse_return_statement(&mut self) -> Result<Statement> {
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
            return Ok(Statement::Return(None));
        }

        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::Semicolon)?;

        Ok(Statement::Return(Some(value)))
    }

    fn parse_import_statement(&mut self) -> Result<Statement> {
        self.expect_peek(TokenKind::Ident)?;
        let mut path = vec![self.cur_token().lexeme.clone()];
        let mut wildcard = false;

        while self.peek_is(TokenKind::Dot) {
            self.next_token();
            if self.peek_is(TokenKind::Asterisk) {
                self.next_token();
                wildcard = true;
                break;
            }
            self.expect_peek(TokenKind::Ident)?;
            path.push(self.cur_token().lexeme.clone());
        }

        if !wildcard && path.len() < 2 {
            return Err(expected(".".to_string(), self.peek_token()));
        }

        self.expect_peek(TokenKind::Semicolon)?;

        let import = if wildcard {
            Import {
                package: path.join("."),
                name: None,
            }
        } else {
            let name = path.pop();
            Import {
                package: path.join("."),
                name,
            }
        };

        Ok(Statement::Import(import))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement> {
        let expression = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::Semicolon)?;

        Ok(Statement::Expression(expression))
    }

    fn parse_block_statement(&mut self) -> Result<Vec<Statement>> {
        self.descend()?;
        self.next_token();

        let mut statements: Vec<Statement> = Vec::new();

        while !self.cur_is(TokenKind::Rbrace) {
            if self.cur_is(TokenKind::Eof) {
                return Err(expected("}".to_string(), self.cur_token()));
            }
            if self.starts_declaration() {
                return Err(unexpected(self.cur_token()));
            }
            let statement = self.parse_statement()?;
            statements.push(statement);
            self.next_token();
        }

        self.depth -= 1;
        Ok(statements)
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expression> {
        self.descend()?;
        let expression = self.parse_operator_expression(precedence);
        self.depth -= 1;
        expression
    }

    fn parse_operator_expression(&mut self, precedence: Precedence) -> Result<Expression> {
        let cur_token = self.cur_token().clone();

        let mut left_exp = match cur_token.kind {
            TokenKind::Ident => self.parse_identifier(cur_token.lexeme, &precedence)?,
            TokenKind::Int => self.parse_integer_literal(&cur_token)?,
            TokenKind::Float => self.parse_float_literal(&cur_token)?,
            TokenKind::String => Expression::Literal(Literal::String(cur_token.lexeme)),
            TokenKind::True => Expression::Literal(Literal::Bool(true)),
            TokenKind::False => Expression::Literal(Literal::Bool(false)),
            TokenKind::Bang | TokenKind::Minus => self.parse_prefix_expression(&cur_token)?,
            TokenKind::Increment | TokenKind::Decrement => {
                self.expect_peek(TokenKind::Ident)?;
                Expression::Update {
                    name: self.cur_token().lexeme.clone(),
                    operator: update_operator(cur_token.kind),
                    prefix: true,
                }
            }
            TokenKind::Lparen => self.parse_grouped_expression()?,
            TokenKind::Lbracket => Expression::Array(self.parse_expression_list(TokenKind::Rbracket)?),
            _ => return Err(unexpected(&cur_token)),
        };

        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            match self.peek_token().kind {
                TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Asterisk
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::LtEq
                | TokenKind::Gt
                | TokenKind::GtEq
                | TokenKind::And
                | TokenKind::Or => {
                    self.next_token();
                    left_exp = self.parse_infix_expression(left_exp)?;
                }
                TokenKind::Lbracket => {
                    self.next_token();
                    left_exp = self.parse_index_expression(left_exp)?;
                }
                _ => return Ok(left_exp),
            };
        }

        Ok(left_exp)
    }

    fn parse_identifier(&mut self, name: String, precedence: &Precedence) -> Result<Expression> {
        let expression = match self.peek_token().kind {
            TokenKind::Lparen => {
                self.next_token();
                let arguments = self.parse_expression_list(TokenKind::Rparen)?;
                Expression::Call { name, arguments }
            }
            TokenKind::Assign | TokenKind::PlusAssign | TokenKind::MinusAssign
                if *precedence == Precedence::Lowest =>
            {
                let operator = match self.next_token().cur_token().kind {
                    TokenKind::PlusAssign => AssignOperator::Add,
                    TokenKind::MinusAssign => AssignOperator::Subtract,
                    _ => AssignOperator::Set,
                };
                self.next_token();
                let value = self.parse_expression(Precedence::Lowest)?;
                Expression::Assign {
                    name,
                    operator,
                    value: Box::new(value),
                }
            }
            TokenKind::Increment | TokenKind::Decrement => {
                let operator = update_operator(self.next_token().cur_token().kind);
                Expression::Update {
                    name,
                    operator,
                    prefix: false,
                }
            }
            _ => Expression::Identifier(name),
        };
        Ok(expression)
    }

    fn parse_prefix_expression(&mut self, token: &Token) -> Result<Expression> {
        let operator = match token.kind {
            TokenKind::Minus => Operator::Minus,
            _ => Operator::Not,
        };
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Ok(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Result<Expression> {
        let token = self.cur_token().clone();
        let operator = Operator::from_token(token.kind).ok_or_else(|| unexpected(&token))?;
        let precedence = self.cur_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Ok(Expression::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_integer_literal(&mut self, token: &Token) -> Result<Expression> {
        let value = token
            .lexeme
            .parse::<i64>()
            .map_err(|_| unexpected(token))?;
        Ok(Expression::Literal(Literal::Int(value)))
    }

    fn parse_float_literal(&mut self, token: &Token) -> Result<Expression> {
        let value = token
            .lexeme
            .parse::<f64>()
            .map_err(|_| unexpected(token))?;
        Ok(Expression::Literal(Literal::Float(value)))
    }

    fn parse_grouped_expression(&mut self) -> Result<Expression> {
        self.next_token();
        let exp = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::Rparen)?;
        Ok(exp)
    }

    fn parse_expression_list(&mut self, end_token: TokenKind) -> Result<Vec<Expression>> {
        let mut expressions: Vec<Expression> = Vec::new();

        if self.peek_is(end_token) {
            self.next_token();
            return Ok(expressions);
        }

        self.next_token();

        expressions.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            expressions.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end_token)?;

        Ok(expressions)
    }

    fn parse_index_expression(&mut self, left: Expression) -> Result<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::Rbracket)?;
        Ok(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }
}

fn update_operator(kind: TokenKind) -> UpdateOperator {
    match kind {
        TokenKind::Decrement => UpdateOperator::Decrement,
        _ => UpdateOperator::Increment,
    }
}

fn expected(expected: String, found: &Token) -> SyntaxError {
    SyntaxError::ExpectedToken {
        expected,
        found: found.to_string(),
        position: found.position,
    }
}

fn unexpected(found: &Token) -> SyntaxError {
    SyntaxError::UnexpectedToken {
        found: found.to_string(),
        position: found.position,
    }
}
