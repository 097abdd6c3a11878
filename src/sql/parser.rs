// SQL Parser
use super::ast::*;
use super::lexer::{Lexer, Token};
use super::types::{ColumnDef, SqlValue};
use super::EngineError;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    next_placeholder: usize,
}

impl Parser {
    pub fn new(sql: &str) -> Result<Self, EngineError> {
        let mut lexer = Lexer::new(sql);
        let tokens = lexer.tokenize()?;

        Ok(Parser {
            tokens,
            position: 0,
            next_placeholder: 0,
        })
    }

    fn current_token(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn peek_token(&self, offset: usize) -> &Token {
        self.tokens.get(self.position + offset).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), EngineError> {
        if self.current_token() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(EngineError::Parse(format!(
                "Expected {}, found {}",
                expected,
                self.current_token()
            )))
        }
    }

    fn consume(&mut self, token: &Token) -> bool {
        if self.current_token() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse_identifier(&mut self) -> Result<String, EngineError> {
        if let Token::Identifier(name) = self.current_token() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(EngineError::Parse(format!(
                "Expected identifier, found {}",
                self.current_token()
            )))
        }
    }

    /// Parse one statement, allowing a trailing semicolon
    pub fn parse(&mut self) -> Result<Statement, EngineError> {
        let statement = match self.current_token() {
            Token::Select => Statement::Select(self.parse_select()?),
            Token::Insert => self.parse_insert()?,
            Token::Create => self.parse_create()?,
            Token::Drop => self.parse_drop()?,
            _ => {
                return Err(EngineError::Parse(format!(
                    "Unexpected token: {}",
                    self.current_token()
                )))
            }
        };
        self.consume(&Token::Semicolon);
        if self.current_token() != &Token::Eof {
            return Err(EngineError::Parse(format!(
                "Unexpected trailing token: {}",
                self.current_token()
            )));
        }
        Ok(statement)
    }

    fn parse_select(&mut self) -> Result<SelectStatement, EngineError> {
        self.expect(Token::Select)?;

        let columns = self.parse_select_items()?;

        let from = if self.consume(&Token::From) {
            Some(self.parse_table_reference()?)
        } else {
            None
        };

        let where_clause = if self.consume(&Token::Where) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let limit = if self.consume(&Token::Limit) {
            Some(self.parse_additive_expression()?)
        } else {
            None
        };

        let offset = if self.consume(&Token::Offset) {
            Some(self.parse_additive_expression()?)
        } else {
            None
        };

        Ok(SelectStatement {
            columns,
            from,
            where_clause,
            limit,
            offset,
        })
    }

    fn parse_select_items(&mut self) -> Result<Vec<SelectItem>, EngineError> {
        let mut items = Vec::new();

        loop {
            if self.consume(&Token::Star) {
                items.push(SelectItem::Wildcard);
            } else {
                let expr = self.parse_expression()?;
                let alias = if self.consume(&Token::As) {
                    Some(self.parse_identifier()?)
                } else {
                    None
                };
                items.push(SelectItem::Expression { expr, alias });
            }

            if !self.consume(&Token::Comma) {
                break;
            }
        }

        Ok(items)
    }

    fn parse_object_name(&mut self) -> Result<ObjectName, EngineError> {
        let first = self.parse_identifier()?;
        if self.consume(&Token::Dot) {
            let name = self.parse_identifier()?;
            Ok(ObjectName {
                database: Some(first),
                name,
            })
        } else {
            Ok(ObjectName {
                database: None,
                name: first,
            })
        }
    }

    fn parse_table_reference(&mut self) -> Result<TableReference, EngineError> {
        let name = self.parse_object_name()?;
        let alias = if self.consume(&Token::As) {
            Some(self.parse_identifier()?)
        } else if let Token::Identifier(_) = self.current_token() {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        Ok(TableReference { name, alias })
    }

    fn parse_expression(&mut self) -> Result<Expression, EngineError> {
        self.parse_or_expression()
    }

    fn parse_or_expression(&mut self) -> Result<Expression, EngineError> {
        let mut left = self.parse_and_expression()?;

        while self.consume(&Token::Or) {
            let right = self.parse_and_expression()?;
            left = Expression::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::Or,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<Expression, EngineError> {
        let mut left = self.parse_not_expression()?;

        while self.consume(&Token::And) {
            let right = self.parse_not_expression()?;
            left = Expression::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::And,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_not_expression(&mut self) -> Result<Expression, EngineError> {
        if self.consume(&Token::Not) {
            let expr = self.parse_not_expression()?;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Not,
                expr: Box::new(expr),
            });
        }
        self.parse_comparison_expression()
    }

    fn parse_comparison_expression(&mut self) -> Result<Expression, EngineError> {
        let left = self.parse_additive_expression()?;

        if self.consume(&Token::Is) {
            let negated = self.consume(&Token::Not);
            self.expect(Token::Null)?;
            return Ok(Expression::IsNull {
                expr: Box::new(left),
                negated,
            });
        }

        let op = match self.current_token() {
            Token::Equal => BinaryOperator::Equal,
            Token::NotEqual => BinaryOperator::NotEqual,
            Token::Less => BinaryOperator::Less,
            Token::Greater => BinaryOperator::Greater,
            Token::LessEqual => BinaryOperator::LessEqual,
            Token::GreaterEqual => BinaryOperator::GreaterEqual,
            _ => return Ok(left),
        };

        self.advance();
        let right = self.parse_additive_expression()?;

        Ok(Expression::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_additive_expression(&mut self) -> Result<Expression, EngineError> {
        let mut left = self.parse_multiplicative_expression()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative_expression()?;
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expression, EngineError> {
        let mut left = self.parse_unary_expression()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                Token::Percent => BinaryOperator::Modulo,
                _ => break,
            };

            self.advance();
            let right = self.parse_unary_expression()?;
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, EngineError> {
        if self.consume(&Token::Minus) {
            let expr = self.parse_unary_expression()?;
            return Ok(match expr {
                Expression::Literal(SqlValue::Integer(n)) => {
                    Expression::Literal(SqlValue::Integer(-n))
                }
                Expression::Literal(SqlValue::Real(f)) => Expression::Literal(SqlValue::Real(-f)),
                other => Expression::UnaryOp {
                    op: UnaryOperator::Minus,
                    expr: Box::new(other),
                },
            });
        }
        self.parse_primary_expression()
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, EngineError> {
        match self.current_token().clone() {
            Token::IntegerLiteral(n) => {
                self.advance();
                Ok(Expression::Literal(SqlValue::Integer(n)))
            }
            Token::FloatLiteral(f) => {
                self.advance();
                Ok(Expression::Literal(SqlValue::Real(f)))
            }
            Token::StringLiteral(s) => {
                self.advance();
                Ok(Expression::Literal(SqlValue::Text(s)))
            }
            Token::True => {
                self.advance();
                Ok(Expression::Literal(SqlValue::Boolean(true)))
            }
            Token::False => {
                self.advance();
                Ok(Expression::Literal(SqlValue::Boolean(false)))
            }
            Token::Null => {
                self.advance();
                Ok(Expression::Literal(SqlValue::Null))
            }
            Token::Placeholder(number) => {
                self.advance();
                let index = match number {
                    Some(n) => n - 1,
                    None => {
                        let index = self.next_placeholder;
                        self.next_placeholder += 1;
                        index
                    }
                };
                Ok(Expression::Placeholder(index))
            }
            Token::Identifier(name) => {
                self.advance();

                if self.consume(&Token::LeftParen) {
                    let args = if self.consume(&Token::Star) {
                        vec![Expression::Wildcard]
                    } else if self.current_token() != &Token::RightParen {
                        self.parse_expression_list()?
                    } else {
                        Vec::new()
                    };
                    self.expect(Token::RightParen)?;
                    Ok(Expression::FunctionCall { name, args })
                } else if self.current_token() == &Token::Dot {
                    self.advance();
                    let column = self.parse_identifier()?;
                    Ok(Expression::QualifiedIdentifier {
                        table: name,
                        column,
                    })
                } else {
                    Ok(Expression::Identifier(name))
                }
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }
            _ => Err(EngineError::Parse(format!(
                "Unexpected token in expression: {}",
                self.current_token()
            ))),
        }
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Expression>, EngineError> {
        let mut exprs = Vec::new();

        loop {
            exprs.push(self.parse_expression()?);

            if !self.consume(&Token::Comma) {
                break;
            }
        }

        Ok(exprs)
    }

    fn parse_insert(&mut self) -> Result<Statement, EngineError> {
        self.expect(Token::Insert)?;
        self.expect(Token::Into)?;
        let table = self.parse_object_name()?;

        let mut columns = Vec::new();
        if self.consume(&Token::LeftParen) {
            loop {
                columns.push(self.parse_identifier()?);
                if !self.consume(&Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RightParen)?;
        }

        self.expect(Token::Values)?;
        let mut values = Vec::new();
        loop {
            self.expect(Token::LeftParen)?;
            values.push(self.parse_expression_list()?);
            self.expect(Token::RightParen)?;
            if !self.consume(&Token::Comma) {
                break;
            }
        }

        Ok(Statement::Insert(InsertStatement {
            table,
            columns,
            values,
        }))
    }

    fn parse_create(&mut self) -> Result<Statement, EngineError> {
        self.expect(Token::Create)?;
        self.expect(Token::Table)?;
        let name = self.parse_object_name()?;

        if self.consume(&Token::As) {
            let query = self.parse_select()?;
            return Ok(Statement::CreateTableAs(CreateTableAsStatement { name, query }));
        }

        self.expect(Token::LeftParen)?;
        let mut columns = Vec::new();
        loop {
            let column = self.parse_identifier()?;
            let declared_type = self.parse_type_name()?;
            columns.push(ColumnDef::new(column, declared_type));
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightParen)?;

        Ok(Statement::CreateTable(CreateTableStatement { name, columns }))
    }

    /// Type names are one or more words with optional size arguments,
    /// e.g. `DOUBLE PRECISION` or `VARCHAR(20)`
    fn parse_type_name(&mut self) -> Result<String, EngineError> {
        let mut words = vec![self.parse_identifier()?];
        while let Token::Identifier(_) = self.current_token() {
            words.push(self.parse_identifier()?);
        }
        let mut type_name = words.join(" ");

        if self.current_token() == &Token::LeftParen
            && matches!(self.peek_token(1), Token::IntegerLiteral(_))
        {
            self.advance();
            let mut sizes = Vec::new();
            loop {
                match self.current_token().clone() {
                    Token::IntegerLiteral(n) => {
                        sizes.push(n.to_string());
                        self.advance();
                    }
                    other => {
                        return Err(EngineError::Parse(format!(
                            "Expected type size, found {}",
                            other
                        )))
                    }
                }
                if !self.consume(&Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RightParen)?;
            type_name = format!("{}({})", type_name, sizes.join(","));
        }
        Ok(type_name)
    }

    fn parse_drop(&mut self) -> Result<Statement, EngineError> {
        self.expect(Token::Drop)?;
        self.expect(Token::Table)?;
        let if_exists = if self.consume(&Token::If) {
            self.expect(Token::Exists)?;
            true
        } else {
            false
        };
        let name = self.parse_object_name()?;
        Ok(Statement::DropTable(DropTableStatement { name, if_exists }))
    }
}
