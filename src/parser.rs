//! Recursive-descent parser: consumes the token stream produced by
//! [`crate::lexer`] and produces the [`crate::ast::Select`] AST.
//!
//! ```text
//! select      := SELECT [DISTINCT] selection_list [WHERE cond_expr]
//!                [ORDER BY sort_list] [OFFSET int] [FETCH FIRST int ROWS ONLY]
//! selection_list := selection ("," selection)*
//! selection   := aggregate_name "(" [CAST "(" column AS type ")" | column] ")"
//!              | CAST "(" column AS type ")"
//!              | column
//! cond_expr   := cond_term (("AND"|"OR") cond_term)*       -- left-associative
//! cond_term   := "NOT" column cond_rhs
//!              | "(" cond_expr ")"
//!              | column cond_rhs
//! cond_rhs    := "="|"!="|"<"|"<="|">"|">=" string
//!              | "LIKE" string
//!              | "IN" "(" string ("," string)* ")"
//!              | "BETWEEN" string "AND" string
//!              | "IS" ["NOT"] "NULL"
//! sort_list   := column [ASC|DESC] ("," column [ASC|DESC])*
//! ```

use crate::ast::*;
use crate::errors::{CompileError, Position};
use crate::lexer::{Keyword, Token, TokenKind};

const AGGREGATE_NAMES: &[&str] = &["COUNT", "SUM", "AVG", "MIN", "MAX"];

pub fn parse(tokens: &[Token]) -> Result<Select, CompileError> {
    let mut parser = Parser { tokens, pos: 0 };
    let select = parser.parse_select()?;
    parser.expect_eof()?;
    Ok(select)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn position(&self) -> Position {
        self.current().position
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn describe(kind: &TokenKind) -> String {
        match kind {
            TokenKind::Keyword(kw) => format!("{kw:?}"),
            TokenKind::Identifier(s) => format!("identifier `{s}`"),
            TokenKind::StringLiteral(s) => format!("string literal '{s}'"),
            TokenKind::IntegerLiteral(s) => format!("integer literal {s}"),
            TokenKind::Eq => "=".into(),
            TokenKind::Ne => "!=".into(),
            TokenKind::Lt => "<".into(),
            TokenKind::Le => "<=".into(),
            TokenKind::Gt => ">".into(),
            TokenKind::Ge => ">=".into(),
            TokenKind::Comma => ",".into(),
            TokenKind::LParen => "(".into(),
            TokenKind::RParen => ")".into(),
            TokenKind::Eof => "end of input".into(),
        }
    }

    fn error(&self, expected: &str) -> CompileError {
        CompileError::ParseError {
            position: self.position(),
            expected: expected.to_string(),
            found: Self::describe(&self.current().kind),
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), CompileError> {
        if self.current().kind == TokenKind::Keyword(kw) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("{kw:?}")))
        }
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.current().kind == TokenKind::Keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_eof(&mut self) -> Result<(), CompileError> {
        if self.current().kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(self.error("end of input"))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, CompileError> {
        match self.current().kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("a column identifier")),
        }
    }

    fn expect_string_literal(&mut self) -> Result<String, CompileError> {
        match self.current().kind.clone() {
            TokenKind::StringLiteral(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.error("a string literal")),
        }
    }

    fn expect_integer_literal(&mut self) -> Result<String, CompileError> {
        match self.current().kind.clone() {
            TokenKind::IntegerLiteral(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.error("an integer literal")),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), CompileError> {
        if self.current().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&Self::describe(&kind)))
        }
    }

    // select := SELECT [DISTINCT] selection_list [WHERE cond_expr]
    //           [ORDER BY sort_list] [OFFSET int] [FETCH FIRST int ROWS ONLY]
    fn parse_select(&mut self) -> Result<Select, CompileError> {
        self.expect_keyword(Keyword::Select)?;
        // DISTINCT is accepted but not required: every emitted statement is
        // DISTINCT regardless (see `eat_keyword` call below), since the
        // grammar has no "NO DISTINCT" marker to suppress it.
        self.eat_keyword(Keyword::Distinct);
        let distinct = true;

        let selections = self.parse_selection_list()?;
        if selections.is_empty() {
            return Err(CompileError::EmptySelectionList);
        }

        let conditions = if self.eat_keyword(Keyword::Where) {
            self.parse_cond_expr()?
        } else {
            Vec::new()
        };

        let order_by = if self.eat_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            self.parse_sort_list()?
        } else {
            OrderBy::default()
        };

        let mut range = Range::default();

        if self.eat_keyword(Keyword::Offset) {
            range.offset = self.expect_integer_literal().map_err(|_| {
                CompileError::InvalidRangeValue("OFFSET requires an integer literal".into())
            })?;
        }

        if self.eat_keyword(Keyword::Fetch) {
            self.expect_keyword(Keyword::First)?;
            range.number_of_rows = self.expect_integer_literal().map_err(|_| {
                CompileError::InvalidRangeValue(
                    "FETCH FIRST requires an integer literal".into(),
                )
            })?;
            self.expect_keyword(Keyword::Rows)?;
            self.expect_keyword(Keyword::Only)?;
        }

        Ok(Select {
            selections,
            conditions,
            order_by,
            range,
            distinct,
        })
    }

    fn parse_selection_list(&mut self) -> Result<Selections, CompileError> {
        let mut selections = vec![self.parse_selection()?];
        while self.current().kind == TokenKind::Comma {
            self.advance();
            selections.push(self.parse_selection()?);
        }
        Ok(selections)
    }

    // selection := aggregate_name "(" [CAST "(" column AS type ")" | column] ")"
    //            | CAST "(" column AS type ")"
    //            | column
    fn parse_selection(&mut self) -> Result<Selection, CompileError> {
        if let TokenKind::Identifier(name) = self.current().kind.clone() {
            if AGGREGATE_NAMES.contains(&name.as_str())
                && self.peek_kind(1) == Some(TokenKind::LParen)
            {
                self.advance(); // aggregate name
                self.advance(); // '('
                let column = if self.current().kind == TokenKind::Keyword(Keyword::Cast) {
                    self.parse_cast_column()?
                } else {
                    Column::new(self.expect_identifier()?)
                };
                self.expect(TokenKind::RParen)?;
                return Ok(Selection::Function(SelectFunction { name, column }));
            }
        }

        if self.current().kind == TokenKind::Keyword(Keyword::Cast) {
            return Ok(Selection::Column(self.parse_cast_column()?));
        }

        Ok(Selection::Column(Column::new(self.expect_identifier()?)))
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind.clone())
    }

    // CAST "(" column AS type ")"
    fn parse_cast_column(&mut self) -> Result<Column, CompileError> {
        self.expect_keyword(Keyword::Cast)?;
        self.expect(TokenKind::LParen)?;
        let name = self.expect_identifier()?;
        self.expect_keyword(Keyword::As)?;
        let cast_type = self.parse_cast_type()?;
        self.expect(TokenKind::RParen)?;
        Ok(Column::with_cast(name, cast_type))
    }

    // <type> is one of varchar(<n>), integer, bigint, numeric.
    fn parse_cast_type(&mut self) -> Result<String, CompileError> {
        let name = self.expect_identifier()?;
        if name == "VARCHAR" {
            self.expect(TokenKind::LParen)?;
            let n = self.expect_integer_literal()?;
            self.expect(TokenKind::RParen)?;
            Ok(format!("varchar({n})"))
        } else {
            Ok(name.to_ascii_lowercase())
        }
    }

    // cond_expr := cond_term (("AND"|"OR") cond_term)*
    fn parse_cond_expr(&mut self) -> Result<Conditions, CompileError> {
        let mut nodes = vec![self.parse_cond_term()?];
        loop {
            if self.eat_keyword(Keyword::And) {
                nodes.push(ConditionNode::And(Box::new(self.parse_cond_term()?)));
            } else if self.eat_keyword(Keyword::Or) {
                nodes.push(ConditionNode::Or(Box::new(self.parse_cond_term()?)));
            } else {
                break;
            }
        }
        Ok(nodes)
    }

    // cond_term := "NOT" column cond_rhs | "(" cond_expr ")" | column cond_rhs
    fn parse_cond_term(&mut self) -> Result<ConditionNode, CompileError> {
        if self.eat_keyword(Keyword::Not) {
            let column = Column::new(self.expect_identifier()?);
            let inner = self.parse_cond_rhs()?;
            return Ok(ConditionNode::Leaf(Condition {
                column,
                expression: ConditionExpression::Not(Box::new(inner)),
            }));
        }

        if self.current().kind == TokenKind::LParen {
            self.advance();
            let inner = self.parse_cond_expr()?;
            self.expect(TokenKind::RParen)?;
            return Ok(ConditionNode::Grouping(inner));
        }

        let column = Column::new(self.expect_identifier()?);
        let expression = self.parse_cond_rhs()?;
        Ok(ConditionNode::Leaf(Condition { column, expression }))
    }

    // cond_rhs := "="|"!="|"<"|"<="|">"|">=" string
    //           | "LIKE" string
    //           | "IN" "(" string ("," string)* ")"
    //           | "BETWEEN" string "AND" string
    //           | "IS" ["NOT"] "NULL"
    fn parse_cond_rhs(&mut self) -> Result<ConditionExpression, CompileError> {
        match self.current().kind.clone() {
            TokenKind::Eq => {
                self.advance();
                Ok(ConditionExpression::Equal(self.expect_string_literal()?))
            }
            TokenKind::Ne => {
                self.advance();
                Ok(ConditionExpression::NotEqual(self.expect_string_literal()?))
            }
            TokenKind::Lt => {
                self.advance();
                Ok(ConditionExpression::LessThan(self.expect_string_literal()?))
            }
            TokenKind::Le => {
                self.advance();
                Ok(ConditionExpression::LessThanOrEqualTo(
                    self.expect_string_literal()?,
                ))
            }
            TokenKind::Gt => {
                self.advance();
                Ok(ConditionExpression::GreaterThan(
                    self.expect_string_literal()?,
                ))
            }
            TokenKind::Ge => {
                self.advance();
                Ok(ConditionExpression::GreaterThanOrEqualTo(
                    self.expect_string_literal()?,
                ))
            }
            TokenKind::Keyword(Keyword::Like) => {
                self.advance();
                Ok(ConditionExpression::Like(self.expect_string_literal()?))
            }
            TokenKind::Keyword(Keyword::In) => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let mut list = vec![self.expect_string_literal()?];
                while self.current().kind == TokenKind::Comma {
                    self.advance();
                    list.push(self.expect_string_literal()?);
                }
                self.expect(TokenKind::RParen)?;
                Ok(ConditionExpression::In(list))
            }
            TokenKind::Keyword(Keyword::Between) => {
                self.advance();
                let low = self.expect_string_literal()?;
                self.expect_keyword(Keyword::And)?;
                let high = self.expect_string_literal()?;
                Ok(ConditionExpression::Between(low, high))
            }
            TokenKind::Keyword(Keyword::Is) => {
                self.advance();
                if self.eat_keyword(Keyword::Not) {
                    self.expect_keyword(Keyword::Null)?;
                    Ok(ConditionExpression::IsNotNull)
                } else {
                    self.expect_keyword(Keyword::Null)?;
                    Ok(ConditionExpression::IsNull)
                }
            }
            _ => Err(self.error("a comparison operator, LIKE, IN, BETWEEN, or IS [NOT] NULL")),
        }
    }

    // sort_list := column [ASC|DESC] ("," column [ASC|DESC])*
    fn parse_sort_list(&mut self) -> Result<OrderBy, CompileError> {
        let mut exprs = vec![self.parse_sort_expression()?];
        while self.current().kind == TokenKind::Comma {
            self.advance();
            exprs.push(self.parse_sort_expression()?);
        }
        Ok(OrderBy { exprs })
    }

    fn parse_sort_expression(&mut self) -> Result<SortExpression, CompileError> {
        let column = self.expect_identifier()?;
        let ascending = if self.eat_keyword(Keyword::Desc) {
            false
        } else {
            self.eat_keyword(Keyword::Asc);
            true
        };
        Ok(SortExpression { column, ascending })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_src(src: &str) -> Select {
        parse(&lex(src).unwrap()).unwrap()
    }

    #[test]
    fn parses_simple_projection_with_default_distinct() {
        let select = parse_src("SELECT COLL_NAME, DATA_NAME");
        assert!(select.distinct);
        assert_eq!(select.selections.len(), 2);
        assert_eq!(
            select.selections[0],
            Selection::Column(Column::new("COLL_NAME"))
        );
    }

    #[test]
    fn parses_aggregate_with_cast() {
        let select = parse_src("SELECT SUM(CAST(DATA_SIZE AS varchar(20)))");
        match &select.selections[0] {
            Selection::Function(f) => {
                assert_eq!(f.name, "SUM");
                assert_eq!(f.column.cast_type.as_deref(), Some("varchar(20)"));
            }
            _ => panic!("expected aggregate"),
        }
    }

    #[test]
    fn parses_where_with_in_and_order_by_and_paging() {
        let select = parse_src(
            "SELECT DATA_NAME WHERE DATA_NAME IN ('a','b','c') ORDER BY DATA_NAME DESC OFFSET 10 FETCH FIRST 5 ROWS ONLY",
        );
        assert_eq!(select.conditions.len(), 1);
        match &select.conditions[0] {
            ConditionNode::Leaf(cond) => {
                assert_eq!(
                    cond.expression,
                    ConditionExpression::In(vec!["a".into(), "b".into(), "c".into()])
                );
            }
            _ => panic!("expected leaf"),
        }
        assert_eq!(select.order_by.exprs[0].ascending, false);
        assert_eq!(select.range.offset, "10");
        assert_eq!(select.range.number_of_rows, "5");
    }

    #[test]
    fn parses_between_and_grouping_and_not() {
        let select =
            parse_src("SELECT DATA_NAME WHERE (DATA_SIZE BETWEEN '1' AND '2') AND NOT DATA_NAME IS NULL");
        assert_eq!(select.conditions.len(), 2);
        assert!(matches!(select.conditions[0], ConditionNode::Grouping(_)));
        match &select.conditions[1] {
            ConditionNode::And(node) => assert!(matches!(
                **node,
                ConditionNode::Leaf(Condition {
                    expression: ConditionExpression::Not(_),
                    ..
                })
            )),
            other => panic!("expected And(Leaf(Not(..))), got {other:?}"),
        }
    }

    #[test]
    fn not_rejects_a_parenthesized_group() {
        let err = parse(&lex("SELECT DATA_NAME WHERE NOT (DATA_NAME IS NULL)").unwrap())
            .unwrap_err();
        assert!(matches!(err, CompileError::ParseError { .. }));
    }

    #[test]
    fn unknown_token_in_where_produces_parse_error() {
        let err = parse(&lex("SELECT DATA_NAME WHERE DATA_NAME").unwrap()).unwrap_err();
        assert!(matches!(err, CompileError::ParseError { .. }));
    }

    #[test]
    fn empty_selection_list_is_rejected_before_where() {
        let err = parse(&lex("SELECT WHERE DATA_NAME = 'x'").unwrap()).unwrap_err();
        assert!(matches!(err, CompileError::ParseError { .. }));
    }
}
