use super::lexer::{tokenize, Spanned, Token};
use super::{
    Comparison, EntityOrigin, EntitySpec, Expression, LogicalOperator, ParseError, TagValue,
};

/// parse a tag filter expression. `AND` binds tighter than `OR`; both are left associative.
/// keywords read as tag names wherever a tag name or key is expected.
pub fn parse(input: &str) -> Result<Expression, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
    };
    if parser.tokens.is_empty() {
        return Err(ParseError::at(0, "empty tag filter expression"));
    }
    let expr = parser.parse_or()?;
    if let Some(extra) = parser.peek() {
        return Err(ParseError::at(
            extra.offset,
            format!("unexpected {}", extra.token.describe()),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn offset(&self) -> usize {
        self.peek().map(|t| t.offset).unwrap_or(self.end)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(found) => ParseError::at(
                found.offset,
                format!("expected {expected}, found {}", found.token.describe()),
            ),
            None => ParseError::at(self.end, format!("expected {expected}, found end of input")),
        }
    }

    fn eat_logical(&mut self, op: LogicalOperator) -> bool {
        match self.peek() {
            Some(Spanned {
                token: Token::Logical(found),
                ..
            }) if *found == op => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat_logical(LogicalOperator::Or) {
            let right = self.parse_and()?;
            left = Expression::logical(left, LogicalOperator::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_primary()?;
        while self.eat_logical(LogicalOperator::And) {
            let right = self.parse_primary()?;
            left = Expression::logical(left, LogicalOperator::And, right);
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        if matches!(self.peek().map(|t| &t.token), Some(Token::LParen)) {
            self.pos += 1;
            let inner = self.parse_or()?;
            match self.peek().map(|t| &t.token) {
                Some(Token::RParen) => {
                    self.pos += 1;
                    Ok(Expression::Bracket(Box::new(inner)))
                }
                _ => Err(self.unexpected("')'")),
            }
        } else {
            self.parse_comparison().map(Expression::Comparison)
        }
    }

    fn parse_comparison(&mut self) -> Result<Comparison, ParseError> {
        let entity = self.parse_entity()?;
        let operator = match self.peek().map(|t| &t.token) {
            Some(Token::Operator(op)) => *op,
            _ => return Err(self.unexpected("operator")),
        };
        self.pos += 1;
        if operator.is_unary() {
            return Ok(Comparison {
                entity,
                operator,
                value: None,
            });
        }
        let value = match self.peek().map(|t| &t.token) {
            Some(Token::String(raw)) => TagValue::String(raw.clone()),
            Some(Token::Number(n)) => TagValue::Number(*n),
            Some(Token::Boolean(b)) => TagValue::Boolean(*b),
            _ => return Err(self.unexpected("string, number or boolean value")),
        };
        self.pos += 1;
        Ok(Comparison {
            entity,
            operator,
            value: Some(value),
        })
    }

    fn parse_entity(&mut self) -> Result<EntitySpec, ParseError> {
        let Some(name) = self.peek().and_then(Spanned::as_name) else {
            return Err(self.unexpected("tag name"));
        };
        self.pos += 1;

        let mut key = None;
        if matches!(self.peek().map(|t| &t.token), Some(Token::Colon)) {
            self.pos += 1;
            let offset = self.offset();
            key = match self.next() {
                Some(Spanned {
                    token: Token::String(raw),
                    ..
                }) => Some(raw),
                Some(found) if found.as_name().is_some() => found.as_name(),
                _ => return Err(ParseError::at(offset, "expected tag key after ':'")),
            };
        }

        let mut origin = EntityOrigin::default();
        if let Some(Token::Origin(found)) = self.peek().map(|t| &t.token) {
            origin = *found;
            self.pos += 1;
        }

        Ok(EntitySpec { name, key, origin })
    }
}

#[cfg(test)]
mod tests {
    use super::super::Operator;
    use super::*;

    fn leaf(name: &str, operator: Operator, value: Option<TagValue>) -> Expression {
        Expression::Comparison(Comparison {
            entity: EntitySpec {
                name: name.to_string(),
                key: None,
                origin: EntityOrigin::Destination,
            },
            operator,
            value,
        })
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse("a IS_EMPTY OR b IS_EMPTY AND c IS_EMPTY").unwrap();
        let expected = Expression::logical(
            leaf("a", Operator::IsEmpty, None),
            LogicalOperator::Or,
            Expression::logical(
                leaf("b", Operator::IsEmpty, None),
                LogicalOperator::And,
                leaf("c", Operator::IsEmpty, None),
            ),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn chains_are_left_associative() {
        let expr = parse("a IS_EMPTY AND b IS_EMPTY AND c IS_EMPTY").unwrap();
        let Expression::Logical { left, right, .. } = expr else {
            panic!("expected logical expression");
        };
        assert!(matches!(*left, Expression::Logical { .. }));
        assert_eq!(*right, leaf("c", Operator::IsEmpty, None));
    }

    #[test]
    fn parses_key_origin_and_typed_values() {
        let expr = parse("agent.tag:stage@src EQUALS 'prod'").unwrap();
        let Expression::Comparison(cmp) = expr else {
            panic!("expected comparison");
        };
        assert_eq!(cmp.entity.key.as_deref(), Some("stage"));
        assert_eq!(cmp.entity.origin, EntityOrigin::Source);
        assert_eq!(cmp.value, Some(TagValue::String("prod".to_string())));

        assert_eq!(
            parse("x GREATER_THAN 10").unwrap(),
            leaf("x", Operator::GreaterThan, Some(TagValue::Number(10.0)))
        );
        assert_eq!(
            parse("x EQUALS false").unwrap(),
            leaf("x", Operator::Equals, Some(TagValue::Boolean(false)))
        );
    }

    #[test]
    fn keeps_brackets() {
        let expr = parse("(a IS_EMPTY)").unwrap();
        assert_eq!(
            expr,
            Expression::Bracket(Box::new(leaf("a", Operator::IsEmpty, None)))
        );
    }

    #[test]
    fn reports_error_positions() {
        let err = parse("a EQUALS").unwrap_err();
        assert_eq!(err.column, 9);
        assert!(err.message.contains("end of input"));

        let err = parse("a EQUALS 'x' b").unwrap_err();
        assert_eq!(err.column, 14);

        let err = parse("a 'x'").unwrap_err();
        assert_eq!(err.column, 3);
        assert!(err.message.contains("operator"));

        let err = parse("(a IS_EMPTY").unwrap_err();
        assert_eq!(err.column, 12);
    }

    #[test]
    fn keywords_are_tag_names_in_entity_position() {
        assert_eq!(
            parse("true EQUALS 'x'").unwrap(),
            leaf("true", Operator::Equals, Some(TagValue::String("x".to_string())))
        );
        assert_eq!(
            parse("a IS_EMPTY AND Equals IS_EMPTY").unwrap(),
            Expression::logical(
                leaf("a", Operator::IsEmpty, None),
                LogicalOperator::And,
                leaf("Equals", Operator::IsEmpty, None),
            )
        );
        let expr = parse("agent.tag:or@src EQUALS false").unwrap();
        let Expression::Comparison(cmp) = expr else {
            panic!("expected comparison");
        };
        assert_eq!(cmp.entity.key.as_deref(), Some("or"));
        assert_eq!(cmp.value, Some(TagValue::Boolean(false)));
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        let err = parse("x EQUALS 1e400").unwrap_err();
        assert_eq!(err.column, 10);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse("   ").is_err());
    }
}
