use super::*;

impl<'a> Parser<'a> {
    /// A statement directly inside a program or function body, where function
    /// declarations are hoisted.
    pub(super) fn parse_source_element(&mut self) -> PResult<Statement> {
        if !self.at_keyword(Keyword::Function) {
            return self.parse_statement();
        }
        let def = self.parse_function(FunctionSite::Declaration)?;
        if let Some(scope) = self.scopes.last_mut() {
            scope.function_declarations.push(def.clone());
        }
        Ok(Statement::FunctionDeclaration(def))
    }

    pub(super) fn parse_statement(&mut self) -> PResult<Statement> {
        let label_run = std::mem::take(&mut self.body.label_run);
        match &self.current.token {
            Token::Punct(Punct::LBrace) => Ok(Statement::Block(self.parse_block()?)),
            Token::Punct(Punct::Semicolon) => {
                self.advance()?;
                Ok(Statement::Empty)
            }
            Token::Keyword(Keyword::Var) => self.parse_variable_statement(),
            Token::Keyword(Keyword::Function) => self.parse_function_in_block(),
            Token::Keyword(Keyword::If) => self.parse_if(),
            Token::Keyword(Keyword::Do) => {
                self.mark_loop_labels(label_run);
                self.parse_do_while()
            }
            Token::Keyword(Keyword::While) => {
                self.mark_loop_labels(label_run);
                self.parse_while()
            }
            Token::Keyword(Keyword::For) => {
                self.mark_loop_labels(label_run);
                self.parse_for()
            }
            Token::Keyword(Keyword::Continue) => self.parse_continue(),
            Token::Keyword(Keyword::Break) => self.parse_break(),
            Token::Keyword(Keyword::Return) => self.parse_return(),
            Token::Keyword(Keyword::With) => self.parse_with(),
            Token::Keyword(Keyword::Switch) => self.parse_switch(),
            Token::Keyword(Keyword::Throw) => self.parse_throw(),
            Token::Keyword(Keyword::Try) => self.parse_try(),
            Token::Keyword(Keyword::Debugger) => {
                self.advance()?;
                self.consume_semicolon()?;
                Ok(Statement::Debugger)
            }
            _ => self.parse_expression_or_labelled(label_run),
        }
    }

    /// The labels directly in front of a loop are the ones `continue` may name.
    fn mark_loop_labels(&mut self, label_run: usize) {
        let labels = &mut self.body.labels;
        let first = labels.len().saturating_sub(label_run);
        for label in &mut labels[first..] {
            label.iteration = true;
        }
    }

    pub(super) fn parse_block(&mut self) -> PResult<Vec<Statement>> {
        self.expect(Punct::LBrace)?;
        let mut statements = Vec::new();
        while !self.eat(Punct::RBrace)? {
            if self.at_eof() {
                return Err(self.unexpected());
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_variable_statement(&mut self) -> PResult<Statement> {
        self.advance()?;
        let declarations = self.parse_variable_declarations()?;
        self.consume_semicolon()?;
        Ok(Statement::Variable(declarations))
    }

    /// Sloppy code may declare functions inside blocks; they bind like a `var`
    /// assigned when control reaches the declaration.
    fn parse_function_in_block(&mut self) -> PResult<Statement> {
        if self.strict {
            return Err(self.error(
                "In strict mode code, functions can only be declared at top level or inside a function body",
            ));
        }
        let def = self.parse_function(FunctionSite::Block)?;
        if let Some(name) = &def.name {
            self.declare_var(name);
        }
        Ok(Statement::FunctionDeclaration(def))
    }

    /// `( Expression )` after `if`, `while`, `with` and `switch`.
    fn parse_parenthesized(&mut self) -> PResult<Expression> {
        self.expect(Punct::LParen)?;
        let expr = self.parse_expression()?;
        self.expect(Punct::RParen)?;
        Ok(expr)
    }

    fn parse_if(&mut self) -> PResult<Statement> {
        self.advance()?;
        let test = self.parse_parenthesized()?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.at_keyword(Keyword::Else) {
            self.advance()?;
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement { test, consequent, alternate }))
    }

    fn parse_loop_body(&mut self) -> PResult<Box<Statement>> {
        self.body.loop_depth += 1;
        let body = self.parse_statement();
        self.body.loop_depth -= 1;
        body.map(Box::new)
    }

    fn parse_do_while(&mut self) -> PResult<Statement> {
        self.advance()?;
        let body = self.parse_loop_body()?;
        self.expect_keyword(Keyword::While)?;
        let test = self.parse_parenthesized()?;
        // the `;` after `do ... while (...)` may be left out even on the same line
        self.eat(Punct::Semicolon)?;
        Ok(Statement::DoWhile(DoWhileStatement { body, test }))
    }

    fn parse_while(&mut self) -> PResult<Statement> {
        self.advance()?;
        let test = self.parse_parenthesized()?;
        let body = self.parse_loop_body()?;
        Ok(Statement::While(WhileStatement { test, body }))
    }

    /// `for (init; test; update)` or `for (target in object)`; the head decides
    /// which once the first clause has been read.
    fn parse_for(&mut self) -> PResult<Statement> {
        self.advance()?;
        self.expect(Punct::LParen)?;
        let init = if self.at(Punct::Semicolon) {
            None
        } else if self.at_keyword(Keyword::Var) {
            self.advance()?;
            let mut declarations = self.with_no_in(true, Self::parse_variable_declarations)?;
            if self.at_keyword(Keyword::In) {
                let (Some(declaration), true) = (declarations.pop(), declarations.is_empty()) else {
                    return Err(self.error("Invalid left-hand side in for-in loop: must have a single binding"));
                };
                return self.parse_for_in(ForInTarget::Variable(declaration));
            }
            Some(ForInit::Variable(declarations))
        } else {
            let expr = self.with_no_in(true, Self::parse_expression)?;
            if self.at_keyword(Keyword::In) {
                self.check_assignment_target(&expr, "Invalid left-hand side in for-in loop")?;
                return self.parse_for_in(ForInTarget::Expression(expr));
            }
            Some(ForInit::Expression(expr))
        };
        self.expect(Punct::Semicolon)?;
        let test = self.parse_optional_expression(Punct::Semicolon)?;
        self.expect(Punct::Semicolon)?;
        let update = self.parse_optional_expression(Punct::RParen)?;
        self.expect(Punct::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(Statement::For(ForStatement { init, test, update, body }))
    }

    fn parse_optional_expression(&mut self, end: Punct) -> PResult<Option<Expression>> {
        if self.at(end) {
            Ok(None)
        } else {
            self.parse_expression().map(Some)
        }
    }

    fn parse_for_in(&mut self, left: ForInTarget) -> PResult<Statement> {
        self.expect_keyword(Keyword::In)?;
        let right = self.parse_expression()?;
        self.expect(Punct::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(Statement::ForIn(ForInStatement { left, right, body }))
    }

    /// The label after `break` or `continue`, which has to be on the same line.
    fn parse_jump_label(&mut self) -> PResult<Option<String>> {
        if self.current.newline_before {
            return Ok(None);
        }
        match self.identifier() {
            Some(name) => {
                self.advance()?;
                Ok(Some(name))
            }
            None => Ok(None),
        }
    }

    fn parse_continue(&mut self) -> PResult<Statement> {
        self.advance()?;
        if self.body.loop_depth == 0 {
            return Err(self.error("Illegal continue statement: no surrounding iteration statement"));
        }
        let label = self.parse_jump_label()?;
        if let Some(name) = &label
            && !self.body.labels.iter().any(|l| l.iteration && &l.name == name)
        {
            return Err(self.error(format!(
                "Illegal continue statement: '{name}' does not denote an iteration statement"
            )));
        }
        self.consume_semicolon()?;
        Ok(Statement::Continue(label))
    }

    fn parse_break(&mut self) -> PResult<Statement> {
        self.advance()?;
        let label = self.parse_jump_label()?;
        match &label {
            Some(name) if !self.body.labels.iter().any(|l| &l.name == name) => {
                return Err(self.error(format!("Undefined label '{name}'")));
            }
            None if self.body.loop_depth == 0 && self.body.switch_depth == 0 => {
                return Err(self.error("Illegal break statement"));
            }
            _ => {}
        }
        self.consume_semicolon()?;
        Ok(Statement::Break(label))
    }

    fn parse_return(&mut self) -> PResult<Statement> {
        if !self.body.in_function {
            return Err(self.error("Illegal return statement"));
        }
        self.advance()?;
        let argument = if self.at(Punct::Semicolon) || self.can_insert_semicolon() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;
        Ok(Statement::Return(argument))
    }

    fn parse_with(&mut self) -> PResult<Statement> {
        if self.strict {
            return Err(self.error("Strict mode code may not include a with statement"));
        }
        self.advance()?;
        let object = self.parse_parenthesized()?;
        let body = self.parse_statement()?;
        Ok(Statement::With(object, Box::new(body)))
    }

    fn parse_switch(&mut self) -> PResult<Statement> {
        self.advance()?;
        let discriminant = self.parse_parenthesized()?;
        self.expect(Punct::LBrace)?;
        self.body.switch_depth += 1;
        let cases = self.parse_case_clauses();
        self.body.switch_depth -= 1;
        Ok(Statement::Switch(SwitchStatement { discriminant, cases: cases? }))
    }

    /// Clauses up to and including the closing `}` of a switch.
    fn parse_case_clauses(&mut self) -> PResult<Vec<SwitchCase>> {
        let mut cases: Vec<SwitchCase> = Vec::new();
        while !self.eat(Punct::RBrace)? {
            let test = if self.at_keyword(Keyword::Case) {
                self.advance()?;
                Some(self.parse_expression()?)
            } else if self.at_keyword(Keyword::Default) {
                if cases.iter().any(|c| c.test.is_none()) {
                    return Err(self.error("More than one default clause in switch statement"));
                }
                self.advance()?;
                None
            } else {
                return Err(self.unexpected());
            };
            self.expect(Punct::Colon)?;
            let mut consequent = Vec::new();
            while !(self.at_keyword(Keyword::Case)
                || self.at_keyword(Keyword::Default)
                || self.at(Punct::RBrace)
                || self.at_eof())
            {
                consequent.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, consequent });
        }
        Ok(cases)
    }

    fn parse_throw(&mut self) -> PResult<Statement> {
        self.advance()?;
        if self.current.newline_before {
            return Err(self.error("Illegal newline after throw"));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::Throw(argument))
    }

    fn parse_try(&mut self) -> PResult<Statement> {
        self.advance()?;
        let block = self.parse_block()?;
        let handler = if self.at_keyword(Keyword::Catch) {
            self.advance()?;
            self.expect(Punct::LParen)?;
            let param = self.expect_binding_identifier()?;
            self.expect(Punct::RParen)?;
            Some(CatchClause { param, body: self.parse_block()? })
        } else {
            None
        };
        let finalizer = if self.at_keyword(Keyword::Finally) {
            self.advance()?;
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }
        Ok(Statement::Try(TryStatement { block, handler, finalizer }))
    }

    /// `label: statement`, or else an expression statement.
    fn parse_expression_or_labelled(&mut self, label_run: usize) -> PResult<Statement> {
        if let Some(name) = self.identifier()
            && self.peek_is(Punct::Colon)?
        {
            self.advance()?;
            self.advance()?;
            if self.body.labels.iter().any(|l| l.name == name) {
                return Err(self.error(format!("Label '{name}' has already been declared")));
            }
            self.body.labels.push(Label { name: name.clone(), iteration: false });
            self.body.label_run = label_run + 1;
            let body = self.parse_statement();
            self.body.labels.pop();
            return Ok(Statement::Labeled(name, Box::new(body?)));
        }
        let expr = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::Expression(expr))
    }
}
