//! Recursive-descent parser producing [`crate::ast`] trees.
//!
//! Early errors (strict mode restrictions, bad labels, misplaced `return` and
//! friends) are reported here so that code which parses is safe to run.

use crate::ast::*;
use crate::lexer::{Keyword, LexError, Lexeme, Lexer, Punct, Token};
use std::fmt;
use std::rc::Rc;

mod declarations;
mod expressions;
mod statements;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyntaxError: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError { message: e.to_string() }
    }
}

type PResult<T> = Result<T, ParseError>;

/// Identifiers that are reserved only in strict code.
const STRICT_RESERVED: &[&str] = &[
    "implements",
    "interface",
    "let",
    "package",
    "private",
    "protected",
    "public",
    "static",
    "yield",
];

fn is_strict_reserved(name: &str) -> bool {
    STRICT_RESERVED.contains(&name)
}

/// `eval` and `arguments` cannot be bound or assigned in strict code.
fn is_restricted_name(name: &str) -> bool {
    name == "eval" || name == "arguments"
}

/// Hoisted `var` names and top-level function declarations of one body.
#[derive(Default)]
struct DeclarationScope {
    var_names: Vec<String>,
    function_declarations: Vec<Rc<FunctionDefinition>>,
}

/// Where a `function` appears, which decides whether it needs a name and how it is bound.
#[derive(Clone, Copy, PartialEq, Eq)]
enum FunctionSite {
    Declaration,
    Block,
    Expression,
}

struct Label {
    name: String,
    iteration: bool,
}

/// Syntactic state that resets at every function boundary.
#[derive(Default)]
struct BodyContext {
    in_function: bool,
    loop_depth: u32,
    switch_depth: u32,
    labels: Vec<Label>,
    /// Labels written directly in front of the statement about to be parsed.
    label_run: usize,
}

pub struct Parser<'a> {
    source: &'a str,
    shared_source: Rc<str>,
    lexer: Lexer<'a>,
    current: Lexeme,
    lookahead: Option<Lexeme>,
    prev_end: usize,
    strict: bool,
    /// Inside a `for (...;` head, where `in` cannot be a relational operator.
    no_in: bool,
    body: BodyContext,
    scopes: Vec<DeclarationScope>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> PResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_lexeme()?;
        Ok(Parser {
            source,
            shared_source: Rc::from(source),
            lexer,
            current,
            lookahead: None,
            prev_end: 0,
            strict: false,
            no_in: false,
            body: BodyContext::default(),
            scopes: Vec::new(),
        })
    }

    pub fn parse_program(&mut self) -> PResult<Program> {
        self.scopes.push(DeclarationScope::default());
        let statements = self.parse_source_elements()?;
        if !self.at_eof() {
            return Err(self.unexpected());
        }
        let scope = self.scopes.pop().unwrap_or_default();
        Ok(Program { body: self.finish_body(self.strict, statements, scope) })
    }

    fn finish_body(&self, strict: bool, statements: Vec<Statement>, scope: DeclarationScope) -> Rc<FunctionBody> {
        Rc::new(FunctionBody {
            strict,
            statements,
            function_declarations: scope.function_declarations,
            var_names: scope.var_names,
            source: self.shared_source.clone(),
        })
    }

    /// Statements up to the closing `}` of a function body or the end of input,
    /// starting with the directive prologue.
    fn parse_source_elements(&mut self) -> PResult<Vec<Statement>> {
        let mut statements = Vec::new();
        let mut prologue = true;
        let mut octal_directive = false;
        while !self.at(Punct::RBrace) && !self.at_eof() {
            let directive = match &self.current.token {
                Token::String { legacy_octal, .. } if prologue => {
                    Some((self.current.start, self.current.end, *legacy_octal))
                }
                _ => None,
            };
            let statement = self.parse_source_element()?;
            match directive {
                Some((start, end, legacy_octal)) if is_string_statement(&statement) => {
                    octal_directive |= legacy_octal;
                    if self.source.get(start + 1..end - 1) == Some("use strict") {
                        self.strict = true;
                    }
                    if self.strict && octal_directive {
                        return Err(self.error("Octal escape sequences are not allowed in strict mode"));
                    }
                }
                _ => prologue = false,
            }
            statements.push(statement);
        }
        Ok(statements)
    }

    // ----- token cursor -----

    fn advance(&mut self) -> PResult<Lexeme> {
        let next = match self.lookahead.take() {
            Some(lexeme) => lexeme,
            None => self.lexer.next_lexeme()?,
        };
        self.prev_end = self.current.end;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Whether the token after the current one is `punct`.
    fn peek_is(&mut self, punct: Punct) -> PResult<bool> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.lexer.next_lexeme()?);
        }
        Ok(matches!(&self.lookahead, Some(next) if next.token == Token::Punct(punct)))
    }

    fn at(&self, punct: Punct) -> bool {
        self.current.token == Token::Punct(punct)
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.current.token == Token::Keyword(keyword)
    }

    fn at_eof(&self) -> bool {
        self.current.token == Token::Eof
    }

    fn eat(&mut self, punct: Punct) -> PResult<bool> {
        let found = self.at(punct);
        if found {
            self.advance()?;
        }
        Ok(found)
    }

    fn expect(&mut self, punct: Punct) -> PResult<()> {
        if self.eat(punct)? {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> PResult<()> {
        if !self.at_keyword(keyword) {
            return Err(self.unexpected());
        }
        self.advance()?;
        Ok(())
    }

    /// Automatic semicolon insertion applies before `}`, at the end of input and
    /// after a line break.
    fn can_insert_semicolon(&self) -> bool {
        self.at(Punct::RBrace) || self.at_eof() || self.current.newline_before
    }

    fn consume_semicolon(&mut self) -> PResult<()> {
        if self.eat(Punct::Semicolon)? || self.can_insert_semicolon() {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Runs `f` with the `in` operator allowed or not, restoring the previous rule.
    fn with_no_in<T>(&mut self, no_in: bool, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let saved = std::mem::replace(&mut self.no_in, no_in);
        let result = f(self);
        self.no_in = saved;
        result
    }

    fn source_since(&self, start: usize) -> String {
        self.source[start..self.prev_end].to_string()
    }

    // ----- errors -----

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: format!("{} (line {})", message.into(), self.lexer.line()),
        }
    }

    fn unexpected(&self) -> ParseError {
        let found = match &self.current.token {
            Token::Eof => "end of input".to_string(),
            Token::Identifier(name) => format!("identifier '{name}'"),
            Token::Keyword(k) => format!("token '{k}'"),
            Token::Punct(p) => format!("token '{}'", p.as_str()),
            Token::Number(_) | Token::LegacyOctal(_) => "number".to_string(),
            Token::String { .. } => "string".to_string(),
            Token::Boolean(b) => format!("token '{b}'"),
            Token::Null => "token 'null'".to_string(),
            Token::RegExp { .. } => "regular expression".to_string(),
        };
        self.error(format!("Unexpected {found}"))
    }

    // ----- identifiers -----

    /// The current token as an Identifier (not a reserved word), if it is one.
    fn identifier(&self) -> Option<String> {
        match &self.current.token {
            Token::Identifier(name)
                if Keyword::lookup(name).is_none()
                    && !matches!(name.as_str(), "null" | "true" | "false")
                    && !(self.strict && is_strict_reserved(name)) =>
            {
                Some(name.clone())
            }
            _ => None,
        }
    }

    fn expect_identifier(&mut self) -> PResult<String> {
        let name = self.identifier().ok_or_else(|| self.unexpected())?;
        self.advance()?;
        Ok(name)
    }

    /// Variable and catch parameter names.
    fn expect_binding_identifier(&mut self) -> PResult<String> {
        let name = self.expect_identifier()?;
        if self.strict && is_restricted_name(&name) {
            return Err(self.error(format!("Unexpected eval or arguments in strict mode: '{name}'")));
        }
        Ok(name)
    }

    fn declare_var(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut()
            && !scope.var_names.iter().any(|n| n == name)
        {
            scope.var_names.push(name.to_string());
        }
    }
}

fn is_string_statement(statement: &Statement) -> bool {
    matches!(statement, Statement::Expression(Expression::Literal(Literal::String(_))))
}

/// Parses global or eval code; `strict` is set for strict direct eval and `--strict`.
pub fn parse_program(source: &str, strict: bool) -> Result<Program, ParseError> {
    let mut parser = Parser::new(source)?;
    parser.strict = strict;
    parser.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Program {
        parse_program(src, false).unwrap()
    }

    fn parse_err(src: &str) -> ParseError {
        match parse_program(src, false) {
            Ok(_) => panic!("expected a syntax error for {src:?}"),
            Err(e) => e,
        }
    }

    #[test]
    fn empty_program() {
        assert!(parse("").body.statements.is_empty());
        assert!(parse("  // nothing\n").body.statements.is_empty());
    }

    #[test]
    fn hoists_vars_but_not_from_nested_functions() {
        let prog = parse(
            "if (a) { var x; } for (var i = 0;;) { try { var y, x } catch (e) {} }
             function f() { var inner; }",
        );
        assert_eq!(prog.body.var_names, ["x", "i", "y"]);
        assert_eq!(prog.body.function_declarations.len(), 1);
        assert_eq!(prog.body.function_declarations[0].body.var_names, ["inner"]);
    }

    #[test]
    fn function_declarations_keep_their_source() {
        let prog = parse("function foo(a, b) { return a + b; }");
        let f = &prog.body.function_declarations[0];
        assert_eq!(f.params, ["a", "b"]);
        assert_eq!(f.source_text, "function foo(a, b) { return a + b; }");
        assert!(!f.in_block);
    }

    #[test]
    fn directive_prologue() {
        assert!(parse("'use strict'; var x;").body.strict);
        assert!(parse("'a'; \"use strict\"").body.strict);
        assert!(!parse(r"'use\x20strict'; var x;").body.strict);
        assert!(!parse("('use strict');").body.strict);
        assert!(!parse("x; 'use strict';").body.strict);
        let prog = parse("function f() { \"use strict\"; }");
        assert!(!prog.body.strict);
        assert!(prog.body.function_declarations[0].body.strict);
        parse_err(r"'use strict'; '\101';");
        parse_err(r"'\101'; 'use strict';");
    }

    #[test]
    fn strict_mode_early_errors() {
        parse_err("'use strict'; with (a) {}");
        parse_err("'use strict'; var eval = 1;");
        parse_err("'use strict'; arguments = 1;");
        parse_err("'use strict'; function f(a, a) {}");
        parse_err("'use strict'; 010;");
        parse_err("'use strict'; var let;");
        parse_err("function f(eval) { 'use strict'; }");
        parse_err("function static() { 'use strict'; }");
        parse_err("'use strict'; delete x;");
        parse_err("'use strict'; ({ a: 1, a: 2 });");
        parse_err("'use strict'; if (1) { function g() {} }");
        assert!(parse_program("var x = 010;", false).is_ok());
        assert!(parse_program("010", true).is_err());
    }

    #[test]
    fn illegal_control_flow() {
        parse_err("return 1;");
        parse_err("break;");
        parse_err("continue;");
        parse_err("while (1) { continue foo; }");
        parse_err("a: { continue a; }");
        parse_err("a: a: ;");
        parse_err("while (1) { (function () { break; }); }");
        parse_err("throw\n1;");
    }

    #[test]
    fn labels_denote_the_loop_directly_after_them() {
        assert!(parse_program("a: b: while (1) { continue a; }", false).is_ok());
        assert!(parse_program("a: { b: while (1) { break a; } }", false).is_ok());
        parse_err("a: { while (1) { continue a; } }");
    }

    #[test]
    fn regexp_literal_after_operators() {
        let prog = parse("var r = /ab+c/gi, s = x / y / z, t = /=/;");
        let Statement::Variable(decls) = &prog.body.statements[0] else {
            panic!("expected a variable statement");
        };
        assert!(matches!(
            &decls[0].init,
            Some(Expression::Literal(Literal::RegExp { pattern, flags })) if pattern == "ab+c" && flags == "gi"
        ));
        assert!(matches!(&decls[1].init, Some(Expression::Binary(BinaryOp::Div, _, _))));
        assert!(matches!(
            &decls[2].init,
            Some(Expression::Literal(Literal::RegExp { pattern, .. })) if pattern == "="
        ));
        parse_err("/a/gg");
        parse_err("/a/x");
    }

    #[test]
    fn asi_rules() {
        let prog = parse("function f() { return\n1 }");
        let body = &prog.body.function_declarations[0].body;
        assert!(matches!(&body.statements[0], Statement::Return(None)));
        assert!(matches!(&body.statements[1], Statement::Expression(_)));
        assert_eq!(parse("a\n++b").body.statements.len(), 2);
        assert!(matches!(
            &parse("do ; while (0) x").body.statements[1],
            Statement::Expression(Expression::Identifier(_))
        ));
        parse_err("a b");
        parse_err("for (;)");
    }
}
