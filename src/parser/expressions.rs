use super::*;
use crate::types::number_ops;
use rustc_hash::FxHashMap;

/// Result of looking at the current token in operator position.
enum Infix {
    Logical(LogicalOp),
    Binary(BinaryOp),
}

// Kinds of property seen so far under one name in an object literal.
const DATA: u8 = 1;
const GETTER: u8 = 2;
const SETTER: u8 = 4;

impl<'a> Parser<'a> {
    pub fn parse_expression(&mut self) -> PResult<Expression> {
        let first = self.parse_assignment_expression()?;
        if !self.at(Punct::Comma) {
            return Ok(first);
        }
        let mut list = vec![first];
        while self.eat(Punct::Comma)? {
            list.push(self.parse_assignment_expression()?);
        }
        Ok(Expression::Comma(list))
    }

    pub(super) fn parse_assignment_expression(&mut self) -> PResult<Expression> {
        let target = self.parse_conditional_expression()?;
        let Token::Punct(punct) = self.current.token else {
            return Ok(target);
        };
        let op = match punct {
            Punct::Eq => None,
            Punct::StarEq => Some(BinaryOp::Mul),
            Punct::SlashEq => Some(BinaryOp::Div),
            Punct::PercentEq => Some(BinaryOp::Mod),
            Punct::PlusEq => Some(BinaryOp::Add),
            Punct::MinusEq => Some(BinaryOp::Sub),
            Punct::ShlEq => Some(BinaryOp::LShift),
            Punct::SarEq => Some(BinaryOp::RShift),
            Punct::ShrEq => Some(BinaryOp::URShift),
            Punct::AmpEq => Some(BinaryOp::BitAnd),
            Punct::CaretEq => Some(BinaryOp::BitXor),
            Punct::PipeEq => Some(BinaryOp::BitOr),
            _ => return Ok(target),
        };
        self.check_assignment_target(&target, "Invalid left-hand side in assignment")?;
        self.advance()?;
        let value = self.parse_assignment_expression()?;
        Ok(Expression::Assign(op, Box::new(target), Box::new(value)))
    }

    /// Early errors for the target of `=`, `++`, `--` and `for-in`.
    pub(super) fn check_assignment_target(&self, target: &Expression, message: &str) -> PResult<()> {
        if !target.is_valid_simple_target() {
            return Err(self.error(message));
        }
        if let Expression::Identifier(name) = target
            && self.strict
            && is_restricted_name(name)
        {
            return Err(self.error(format!("Unexpected eval or arguments in strict mode: '{name}'")));
        }
        Ok(())
    }

    fn parse_conditional_expression(&mut self) -> PResult<Expression> {
        let test = self.parse_binary_expression(1)?;
        if !self.eat(Punct::Question)? {
            return Ok(test);
        }
        let consequent = self.with_no_in(false, Self::parse_assignment_expression)?;
        self.expect(Punct::Colon)?;
        let alternate = self.parse_assignment_expression()?;
        Ok(Expression::Conditional(
            Box::new(test),
            Box::new(consequent),
            Box::new(alternate),
        ))
    }

    /// The binary operator at the current token and how tightly it binds,
    /// from 1 for `||` up to 10 for `*`, `/` and `%`.
    fn infix_operator(&self) -> Option<(u8, Infix)> {
        let binary = |precedence: u8, op: BinaryOp| Some((precedence, Infix::Binary(op)));
        match &self.current.token {
            Token::Punct(punct) => match punct {
                Punct::PipePipe => Some((1, Infix::Logical(LogicalOp::Or))),
                Punct::AmpAmp => Some((2, Infix::Logical(LogicalOp::And))),
                Punct::Pipe => binary(3, BinaryOp::BitOr),
                Punct::Caret => binary(4, BinaryOp::BitXor),
                Punct::Amp => binary(5, BinaryOp::BitAnd),
                Punct::EqEq => binary(6, BinaryOp::Eq),
                Punct::NotEq => binary(6, BinaryOp::NotEq),
                Punct::EqEqEq => binary(6, BinaryOp::StrictEq),
                Punct::NotEqEq => binary(6, BinaryOp::StrictNotEq),
                Punct::Less => binary(7, BinaryOp::Lt),
                Punct::Greater => binary(7, BinaryOp::Gt),
                Punct::LessEq => binary(7, BinaryOp::LtEq),
                Punct::GreaterEq => binary(7, BinaryOp::GtEq),
                Punct::Shl => binary(8, BinaryOp::LShift),
                Punct::Sar => binary(8, BinaryOp::RShift),
                Punct::Shr => binary(8, BinaryOp::URShift),
                Punct::Plus => binary(9, BinaryOp::Add),
                Punct::Minus => binary(9, BinaryOp::Sub),
                Punct::Star => binary(10, BinaryOp::Mul),
                Punct::Slash => binary(10, BinaryOp::Div),
                Punct::Percent => binary(10, BinaryOp::Mod),
                _ => None,
            },
            Token::Keyword(Keyword::Instanceof) => binary(7, BinaryOp::Instanceof),
            Token::Keyword(Keyword::In) if !self.no_in => binary(7, BinaryOp::In),
            _ => None,
        }
    }

    /// Precedence climbing: operators binding looser than `min_precedence`
    /// are left for a caller further up.
    fn parse_binary_expression(&mut self, min_precedence: u8) -> PResult<Expression> {
        let mut left = self.parse_unary_expression()?;
        while let Some((precedence, infix)) = self.infix_operator() {
            if precedence < min_precedence {
                break;
            }
            self.advance()?;
            let right = Box::new(self.parse_binary_expression(precedence + 1)?);
            left = match infix {
                Infix::Logical(op) => Expression::Logical(op, Box::new(left), right),
                Infix::Binary(op) => Expression::Binary(op, Box::new(left), right),
            };
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> PResult<Expression> {
        let op = match &self.current.token {
            Token::Keyword(Keyword::Delete) => UnaryOp::Delete,
            Token::Keyword(Keyword::Void) => UnaryOp::Void,
            Token::Keyword(Keyword::Typeof) => UnaryOp::Typeof,
            Token::Punct(Punct::Plus) => UnaryOp::Plus,
            Token::Punct(Punct::Minus) => UnaryOp::Minus,
            Token::Punct(Punct::Tilde) => UnaryOp::BitNot,
            Token::Punct(Punct::Bang) => UnaryOp::Not,
            Token::Punct(Punct::PlusPlus) => return self.parse_prefix_update(UpdateOp::PreIncrement),
            Token::Punct(Punct::MinusMinus) => return self.parse_prefix_update(UpdateOp::PreDecrement),
            _ => return self.parse_postfix_expression(),
        };
        self.advance()?;
        let operand = self.parse_unary_expression()?;
        if op == UnaryOp::Delete && self.strict && matches!(operand, Expression::Identifier(_)) {
            return Err(self.error("Delete of an unqualified identifier in strict mode"));
        }
        Ok(Expression::Unary(op, Box::new(operand)))
    }

    fn parse_prefix_update(&mut self, op: UpdateOp) -> PResult<Expression> {
        self.advance()?;
        let target = self.parse_unary_expression()?;
        self.check_assignment_target(&target, "Invalid left-hand side expression in prefix operation")?;
        Ok(Expression::Update(op, Box::new(target)))
    }

    /// `x++` and `x--`; a line break before the operator ends the expression instead.
    fn parse_postfix_expression(&mut self) -> PResult<Expression> {
        let operand = self.parse_left_hand_side_expression()?;
        if self.current.newline_before {
            return Ok(operand);
        }
        let op = if self.at(Punct::PlusPlus) {
            UpdateOp::PostIncrement
        } else if self.at(Punct::MinusMinus) {
            UpdateOp::PostDecrement
        } else {
            return Ok(operand);
        };
        self.check_assignment_target(&operand, "Invalid left-hand side expression in postfix operation")?;
        self.advance()?;
        Ok(Expression::Update(op, Box::new(operand)))
    }

    fn parse_left_hand_side_expression(&mut self) -> PResult<Expression> {
        let mut expr = self.parse_member_expression()?;
        loop {
            if self.at(Punct::LParen) {
                let args = self.parse_arguments()?;
                expr = Expression::Call(Box::new(expr), args);
            } else if let Some(key) = self.parse_member_key()? {
                expr = Expression::Member(Box::new(expr), key);
            } else {
                return Ok(expr);
            }
        }
    }

    /// A primary expression or `new` target followed by property accesses.
    /// `new` takes the nearest argument list, if any.
    fn parse_member_expression(&mut self) -> PResult<Expression> {
        let mut expr = if self.at_keyword(Keyword::New) {
            self.advance()?;
            let callee = self.parse_member_expression()?;
            let args = if self.at(Punct::LParen) {
                self.parse_arguments()?
            } else {
                Vec::new()
            };
            Expression::New(Box::new(callee), args)
        } else {
            self.parse_primary_expression()?
        };
        while let Some(key) = self.parse_member_key()? {
            expr = Expression::Member(Box::new(expr), key);
        }
        Ok(expr)
    }

    /// `.name` or `[expression]`, if one comes next.
    fn parse_member_key(&mut self) -> PResult<Option<MemberKey>> {
        if self.eat(Punct::Dot)? {
            return self.parse_identifier_name().map(|name| Some(MemberKey::Name(name)));
        }
        if self.eat(Punct::LBracket)? {
            let key = self.with_no_in(false, Self::parse_expression)?;
            self.expect(Punct::RBracket)?;
            return Ok(Some(MemberKey::Computed(Box::new(key))));
        }
        Ok(None)
    }

    /// Any identifier including reserved words, as allowed after `.` and
    /// before `:` in an object literal.
    fn parse_identifier_name(&mut self) -> PResult<String> {
        let name = match &self.current.token {
            Token::Identifier(name) => name.clone(),
            Token::Keyword(keyword) => keyword.to_string(),
            Token::Boolean(b) => b.to_string(),
            Token::Null => "null".to_string(),
            _ => return Err(self.unexpected()),
        };
        self.advance()?;
        Ok(name)
    }

    fn parse_arguments(&mut self) -> PResult<Vec<Expression>> {
        self.expect(Punct::LParen)?;
        self.with_no_in(false, |p| {
            let mut args = Vec::new();
            if p.eat(Punct::RParen)? {
                return Ok(args);
            }
            loop {
                args.push(p.parse_assignment_expression()?);
                if p.eat(Punct::RParen)? {
                    return Ok(args);
                }
                p.expect(Punct::Comma)?;
            }
        })
    }

    fn reject_octal_in_strict(&self, octal: bool) -> PResult<()> {
        if octal && self.strict {
            Err(self.error("Octal literals are not allowed in strict mode"))
        } else {
            Ok(())
        }
    }

    fn parse_primary_expression(&mut self) -> PResult<Expression> {
        let literal = match &self.current.token {
            Token::Keyword(Keyword::This) => {
                self.advance()?;
                return Ok(Expression::This);
            }
            Token::Keyword(Keyword::Function) => {
                return self.parse_function(FunctionSite::Expression).map(Expression::Function);
            }
            Token::Identifier(_) => return self.expect_identifier().map(Expression::Identifier),
            Token::Punct(Punct::LParen) => {
                self.advance()?;
                let expr = self.with_no_in(false, Self::parse_expression)?;
                self.expect(Punct::RParen)?;
                return Ok(expr);
            }
            Token::Punct(Punct::LBracket) => return self.parse_array_literal(),
            Token::Punct(Punct::LBrace) => return self.parse_object_literal(),
            Token::Punct(Punct::Slash | Punct::SlashEq) => return self.parse_regexp_literal(),
            Token::Null => Literal::Null,
            Token::Boolean(b) => Literal::Boolean(*b),
            Token::Number(n) => Literal::Number(*n),
            Token::LegacyOctal(n) => {
                self.reject_octal_in_strict(true)?;
                Literal::Number(*n)
            }
            Token::String { units, legacy_octal } => {
                self.reject_octal_in_strict(*legacy_octal)?;
                Literal::String(units.clone())
            }
            _ => return Err(self.unexpected()),
        };
        self.advance()?;
        Ok(Expression::Literal(literal))
    }

    /// A `/` in operand position starts a regular expression; the lexer scans it
    /// again from the slash with regexp rules.
    fn parse_regexp_literal(&mut self) -> PResult<Expression> {
        let newline_before = self.current.newline_before;
        self.current = Lexeme { newline_before, ..self.lexer.scan_regexp(self.current.start)? };
        self.lookahead = None;
        let literal = match &self.current.token {
            Token::RegExp { pattern, flags } => {
                for (i, flag) in flags.char_indices() {
                    if !matches!(flag, 'g' | 'i' | 'm') || flags[..i].contains(flag) {
                        return Err(self.error(format!("Invalid regular expression flags '{flags}'")));
                    }
                }
                Literal::RegExp { pattern: pattern.clone(), flags: flags.clone() }
            }
            _ => return Err(self.unexpected()),
        };
        self.advance()?;
        Ok(Expression::Literal(literal))
    }

    /// `[a, , b,]`: holes are `None` and a single trailing comma adds nothing.
    fn parse_array_literal(&mut self) -> PResult<Expression> {
        self.advance()?;
        self.with_no_in(false, |p| {
            let mut elements = Vec::new();
            loop {
                if p.eat(Punct::RBracket)? {
                    return Ok(Expression::Array(elements));
                }
                if p.eat(Punct::Comma)? {
                    elements.push(None);
                    continue;
                }
                elements.push(Some(p.parse_assignment_expression()?));
                if !p.at(Punct::RBracket) {
                    p.expect(Punct::Comma)?;
                }
            }
        })
    }

    fn parse_object_literal(&mut self) -> PResult<Expression> {
        self.advance()?;
        self.with_no_in(false, |p| {
            let mut properties = Vec::new();
            let mut seen = FxHashMap::default();
            while !p.eat(Punct::RBrace)? {
                let property = p.parse_property_assignment()?;
                p.check_duplicate_property(&mut seen, &property)?;
                properties.push(property);
                if !p.at(Punct::RBrace) {
                    p.expect(Punct::Comma)?;
                }
            }
            Ok(Expression::Object(properties))
        })
    }

    /// `name: value`, `get name() {...}` or `set name(v) {...}`.
    fn parse_property_assignment(&mut self) -> PResult<Property> {
        let start = self.current.start;
        let accessor = match &self.current.token {
            Token::Identifier(word) if word == "get" || word == "set" => Some(word == "get"),
            _ => None,
        };
        let key = self.parse_property_name()?;
        let Some(is_getter) = accessor.filter(|_| !self.at(Punct::Colon)) else {
            self.expect(Punct::Colon)?;
            let value = self.parse_assignment_expression()?;
            return Ok(Property { key, value: PropertyValue::Data(value) });
        };
        let key = self.parse_property_name()?;
        let params = self.parse_formal_parameters()?;
        if is_getter && !params.is_empty() {
            return Err(self.error("Getter must not have any formal parameters"));
        }
        if !is_getter && params.len() != 1 {
            return Err(self.error("Setter must have exactly one formal parameter"));
        }
        let body = self.parse_function_body(&params, None)?;
        let def = Rc::new(FunctionDefinition {
            name: None,
            params,
            body,
            source_text: self.source_since(start),
            in_block: false,
        });
        let value = if is_getter { PropertyValue::Get(def) } else { PropertyValue::Set(def) };
        Ok(Property { key, value })
    }

    /// Identifier names, strings and numbers; numbers are keyed by their
    /// canonical string form.
    fn parse_property_name(&mut self) -> PResult<String> {
        let key = match &self.current.token {
            Token::String { units, legacy_octal } => {
                self.reject_octal_in_strict(*legacy_octal)?;
                String::from_utf16_lossy(units)
            }
            Token::Number(n) => number_ops::to_string(*n),
            Token::LegacyOctal(n) => {
                self.reject_octal_in_strict(true)?;
                number_ops::to_string(*n)
            }
            _ => return self.parse_identifier_name(),
        };
        self.advance()?;
        Ok(key)
    }

    /// A name may not be both data and accessor, nor have two getters or two
    /// setters; strict code also forbids repeating a data property.
    fn check_duplicate_property(&self, seen: &mut FxHashMap<String, u8>, property: &Property) -> PResult<()> {
        let kind = match property.value {
            PropertyValue::Data(_) => DATA,
            PropertyValue::Get(_) => GETTER,
            PropertyValue::Set(_) => SETTER,
        };
        let previous = seen.entry(property.key.clone()).or_default();
        let clash = if kind == DATA {
            *previous & (GETTER | SETTER) != 0 || (self.strict && *previous & DATA != 0)
        } else {
            *previous & (DATA | kind) != 0
        };
        if clash {
            return Err(self.error(format!("Duplicate property '{}' in object literal", property.key)));
        }
        *previous |= kind;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(src: &str) -> Expression {
        let program = parse_program(src, false).unwrap();
        match &program.body.statements[0] {
            Statement::Expression(e) => e.clone(),
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn binary_operators_follow_precedence() {
        let Expression::Logical(LogicalOp::Or, left, right) = expr("a && b || c | d ^ e & f") else {
            panic!("|| should be outermost");
        };
        assert!(matches!(*left, Expression::Logical(LogicalOp::And, _, _)));
        assert!(matches!(*right, Expression::Binary(BinaryOp::BitOr, _, _)));

        let Expression::Binary(BinaryOp::Sub, left, right) = expr("1 - 2 - 3 * 4") else {
            panic!("- should be outermost");
        };
        assert!(matches!(*left, Expression::Binary(BinaryOp::Sub, _, _)));
        assert!(matches!(*right, Expression::Binary(BinaryOp::Mul, _, _)));

        assert!(matches!(
            expr("a < b == c << d"),
            Expression::Binary(BinaryOp::Eq, _, _)
        ));
    }

    #[test]
    fn assignment_is_right_associative() {
        let Expression::Assign(None, _, value) = expr("a = b += c") else {
            panic!("expected a plain assignment");
        };
        assert!(matches!(*value, Expression::Assign(Some(BinaryOp::Add), _, _)));
        assert!(parse_program("1 = 2", false).is_err());
        assert!(parse_program("a + b = c", false).is_err());
        assert!(parse_program("f() = 1", false).is_ok());
    }

    #[test]
    fn new_takes_the_nearest_arguments() {
        let Expression::Call(callee, args) = expr("new f(1)(2)") else {
            panic!("expected a call of the constructed object");
        };
        assert!(matches!(*callee, Expression::New(_, ref a) if a.len() == 1));
        assert_eq!(args.len(), 1);
        assert!(matches!(
            expr("new a.b.C"),
            Expression::New(callee, args) if args.is_empty() && matches!(*callee, Expression::Member(..))
        ));
    }

    #[test]
    fn update_expressions() {
        assert!(matches!(expr("++a"), Expression::Update(UpdateOp::PreIncrement, _)));
        assert!(matches!(expr("a.b--"), Expression::Update(UpdateOp::PostDecrement, _)));
        assert!(parse_program("++1", false).is_err());
        assert!(parse_program("'use strict'; eval++", false).is_err());
    }

    #[test]
    fn literals() {
        let Expression::Array(elements) = expr("[1, , 'x',]") else {
            panic!("expected an array literal");
        };
        assert_eq!(elements.len(), 3);
        assert!(elements[1].is_none());

        let Expression::Object(props) = expr("({ if: 1, 'b': 2, 3: 3, get x() { return 1; }, set x(v) {} })") else {
            panic!("expected an object literal");
        };
        let keys: Vec<_> = props.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["if", "b", "3", "x", "x"]);
        assert!(matches!(props[3].value, PropertyValue::Get(_)));
        assert!(matches!(props[4].value, PropertyValue::Set(_)));
    }

    #[test]
    fn object_literal_early_errors() {
        assert!(parse_program("({ a: 1, a: 2 })", false).is_ok());
        assert!(parse_program("({ a: 1, get a() {} })", false).is_err());
        assert!(parse_program("({ get a() {}, get a() {} })", false).is_err());
        assert!(parse_program("({ get a() {}, set a(v) {} })", false).is_ok());
        assert!(parse_program("({ get a(x) {} })", false).is_err());
        assert!(parse_program("({ set a() {} })", false).is_err());
    }

    #[test]
    fn in_is_excluded_from_for_heads_only() {
        assert!(matches!(
            parse_program("for (var i = 'a' in o) ;", false).unwrap().body.statements[0],
            Statement::ForIn(_)
        ));
        assert!(matches!(
            parse_program("for (var i = ('a' in o); i;) ;", false).unwrap().body.statements[0],
            Statement::For(_)
        ));
        assert!(matches!(expr("'a' in o"), Expression::Binary(BinaryOp::In, _, _)));
        assert!(parse_program("for (a + b in o) ;", false).is_err());
    }
}
