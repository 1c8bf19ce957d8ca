use super::*;

impl<'a> Parser<'a> {
    /// `name [= value], ...` after `var`; every name is hoisted to the enclosing body.
    pub(super) fn parse_variable_declarations(&mut self) -> PResult<Vec<VariableDeclarator>> {
        let mut declarations = Vec::new();
        loop {
            let name = self.expect_binding_identifier()?;
            let init = if self.eat(Punct::Eq)? {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };
            self.declare_var(&name);
            declarations.push(VariableDeclarator { name, init });
            if !self.eat(Punct::Comma)? {
                return Ok(declarations);
            }
        }
    }

    pub(super) fn parse_function(&mut self, site: FunctionSite) -> PResult<Rc<FunctionDefinition>> {
        let start = self.current.start;
        self.expect_keyword(Keyword::Function)?;
        let name = match self.identifier() {
            Some(name) => {
                self.advance()?;
                Some(name)
            }
            None if site == FunctionSite::Expression => None,
            None => return Err(self.unexpected()),
        };
        let params = self.parse_formal_parameters()?;
        let body = self.parse_function_body(&params, name.as_deref())?;
        Ok(Rc::new(FunctionDefinition {
            name,
            params,
            body,
            source_text: self.source_since(start),
            in_block: site == FunctionSite::Block,
        }))
    }

    pub(super) fn parse_formal_parameters(&mut self) -> PResult<Vec<String>> {
        self.expect(Punct::LParen)?;
        let mut params = Vec::new();
        if self.eat(Punct::RParen)? {
            return Ok(params);
        }
        loop {
            params.push(self.expect_identifier()?);
            if self.eat(Punct::RParen)? {
                return Ok(params);
            }
            self.expect(Punct::Comma)?;
        }
    }

    /// `{ ... }` of a function. Labels, loops and `in` handling start over inside.
    /// The name and parameters are checked afterwards since a `"use strict"`
    /// directive in the body applies to them too.
    pub(super) fn parse_function_body(
        &mut self,
        params: &[String],
        name: Option<&str>,
    ) -> PResult<Rc<FunctionBody>> {
        self.expect(Punct::LBrace)?;
        let outer_body = std::mem::replace(
            &mut self.body,
            BodyContext { in_function: true, ..BodyContext::default() },
        );
        let outer_strict = self.strict;
        self.scopes.push(DeclarationScope::default());
        let parsed = self.with_no_in(false, Self::parse_source_elements);
        let scope = self.scopes.pop().unwrap_or_default();
        self.body = outer_body;
        let strict = std::mem::replace(&mut self.strict, outer_strict);
        let statements = parsed?;
        if strict {
            self.check_strict_signature(params, name)?;
        }
        self.expect(Punct::RBrace)?;
        Ok(self.finish_body(strict, statements, scope))
    }

    fn check_strict_signature(&self, params: &[String], name: Option<&str>) -> PResult<()> {
        let forbidden = |n: &str| is_restricted_name(n) || is_strict_reserved(n);
        if let Some(name) = name
            && forbidden(name)
        {
            return Err(self.error(format!("Function name '{name}' is not allowed in strict mode")));
        }
        for (i, param) in params.iter().enumerate() {
            if forbidden(param) {
                return Err(self.error(format!("Parameter name '{param}' is not allowed in strict mode")));
            }
            if params[..i].contains(param) {
                return Err(self.error(format!(
                    "Duplicate parameter name '{param}' not allowed in strict mode"
                )));
            }
        }
        Ok(())
    }
}
