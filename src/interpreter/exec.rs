use super::*;
use rustc_hash::FxHashSet;

/// Unwraps an expression result while executing a statement; an error ends the
/// statement with a throw completion.
macro_rules! complete {
    ($self:ident, $e:expr) => {
        match $e {
            Ok(v) => v,
            Err(err) => return Completion::Throw($self.error_to_value(err)),
        }
    };
}

/// Whether an iteration statement goes on after its body completed with `c`.
fn loop_continues(c: &Completion, labels: &[String]) -> bool {
    match c {
        Completion::Normal(_) | Completion::Continue(None, _) => true,
        Completion::Continue(Some(l), _) => labels.contains(l),
        _ => false,
    }
}

/// The completion of a loop that stopped after its body completed with `c`;
/// `value` is the last value any iteration produced.
fn exit_loop(c: Completion, labels: &[String], value: Option<JsValue>) -> Completion {
    match c {
        Completion::Break(None, _) => Completion::Normal(value),
        Completion::Break(Some(l), _) if labels.contains(&l) => Completion::Normal(value),
        other => other.or_value(value),
    }
}

impl Interpreter {
    pub(crate) fn exec_statements(&mut self, stmts: &[Statement]) -> Completion {
        let mut value = None;
        for stmt in stmts {
            let c = self.exec_statement(stmt);
            if c.is_abrupt() {
                return c.or_value(value);
            }
            if let Some(v) = c.value() {
                value = Some(v);
            }
        }
        Completion::Normal(value)
    }

    pub(crate) fn exec_statement(&mut self, stmt: &Statement) -> Completion {
        // the label set belongs to this statement only
        let labels = std::mem::take(&mut self.context_mut().label_set);
        match stmt {
            Statement::Empty | Statement::Debugger => Completion::empty(),
            Statement::Expression(expr) => {
                let v = complete!(self, self.eval_expression(expr));
                Completion::Normal(Some(v))
            }
            Statement::Block(stmts) => self.exec_statements(stmts),
            Statement::Variable(decls) => self.exec_variable_declarations(decls),
            Statement::If(s) => {
                let test = complete!(self, self.eval_expression(&s.test));
                if to_boolean(&test) {
                    self.exec_statement(&s.consequent)
                } else if let Some(alternate) = &s.alternate {
                    self.exec_statement(alternate)
                } else {
                    Completion::empty()
                }
            }
            Statement::While(s) => self.exec_while(s, &labels),
            Statement::DoWhile(s) => self.exec_do_while(s, &labels),
            Statement::For(s) => self.exec_for(s, &labels),
            Statement::ForIn(s) => self.exec_for_in(s, &labels),
            Statement::Return(arg) => {
                let v = match arg {
                    Some(e) => complete!(self, self.eval_expression(e)),
                    None => JsValue::Undefined,
                };
                Completion::Return(v)
            }
            Statement::Break(label) => Completion::Break(label.clone(), None),
            Statement::Continue(label) => Completion::Continue(label.clone(), None),
            Statement::Throw(e) => {
                let v = complete!(self, self.eval_expression(e));
                Completion::Throw(v)
            }
            Statement::Try(s) => self.exec_try(s),
            Statement::Switch(s) => self.exec_switch(s, &labels),
            Statement::Labeled(label, body) => {
                let mut labels = labels;
                labels.push(label.clone());
                self.context_mut().label_set = labels;
                match self.exec_statement(body) {
                    Completion::Break(Some(l), v) if &l == label => Completion::Normal(v),
                    other => other,
                }
            }
            Statement::With(object, body) => {
                let v = complete!(self, self.eval_expression(object));
                let obj = complete!(self, self.to_object(&v));
                let env = Environment::new_object(obj, Some(self.lexical_env()), true);
                self.with_lexical_env(env, |this| this.exec_statement(body))
            }
            Statement::FunctionDeclaration(def) => {
                if def.in_block
                    && let Some(name) = &def.name
                {
                    let f = self.instantiate_function(def, self.lexical_env());
                    let reference = self.identifier_reference(name);
                    complete!(self, self.put_value(&reference, JsValue::Object(f)));
                }
                Completion::empty()
            }
        }
    }

    pub(crate) fn exec_variable_declarations(&mut self, decls: &[VariableDeclarator]) -> Completion {
        for decl in decls {
            let Some(init) = &decl.init else {
                continue;
            };
            let reference = self.identifier_reference(&decl.name);
            let v = complete!(self, self.eval_expression(init));
            complete!(self, self.put_value(&reference, v));
        }
        Completion::empty()
    }

    fn exec_while(&mut self, s: &WhileStatement, labels: &[String]) -> Completion {
        let mut value = None;
        loop {
            let test = complete!(self, self.eval_expression(&s.test));
            if !to_boolean(&test) {
                return Completion::Normal(value);
            }
            let c = self.exec_statement(&s.body);
            if let Some(v) = c.value() {
                value = Some(v);
            }
            if !loop_continues(&c, labels) {
                return exit_loop(c, labels, value);
            }
        }
    }

    fn exec_do_while(&mut self, s: &DoWhileStatement, labels: &[String]) -> Completion {
        let mut value = None;
        loop {
            let c = self.exec_statement(&s.body);
            if let Some(v) = c.value() {
                value = Some(v);
            }
            if !loop_continues(&c, labels) {
                return exit_loop(c, labels, value);
            }
            let test = complete!(self, self.eval_expression(&s.test));
            if !to_boolean(&test) {
                return Completion::Normal(value);
            }
        }
    }

    fn exec_for(&mut self, s: &ForStatement, labels: &[String]) -> Completion {
        match &s.init {
            Some(ForInit::Variable(decls)) => {
                let c = self.exec_variable_declarations(decls);
                if c.is_abrupt() {
                    return c;
                }
            }
            Some(ForInit::Expression(e)) => {
                complete!(self, self.eval_expression(e));
            }
            None => {}
        }
        let mut value = None;
        loop {
            if let Some(test) = &s.test {
                let test = complete!(self, self.eval_expression(test));
                if !to_boolean(&test) {
                    return Completion::Normal(value);
                }
            }
            let c = self.exec_statement(&s.body);
            if let Some(v) = c.value() {
                value = Some(v);
            }
            if !loop_continues(&c, labels) {
                return exit_loop(c, labels, value);
            }
            if let Some(update) = &s.update {
                complete!(self, self.eval_expression(update));
            }
        }
    }

    /// Enumerable property names of `o` and its prototypes, skipping names
    /// shadowed by an object earlier in the chain.
    fn enumerable_keys(&self, o: JsObject) -> Vec<String> {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut keys = Vec::new();
        let mut current = Some(o);
        while let Some(obj) = current {
            for key in self.own_property_keys(obj) {
                if !seen.insert(key.clone()) {
                    continue;
                }
                if self
                    .get_own_property(obj, &key)
                    .is_some_and(|d| d.enumerable())
                {
                    keys.push(key);
                }
            }
            current = self.get_object(obj).borrow().prototype;
        }
        keys
    }

    fn exec_for_in(&mut self, s: &ForInStatement, labels: &[String]) -> Completion {
        if let ForInTarget::Variable(decl) = &s.left {
            let c = self.exec_variable_declarations(std::slice::from_ref(decl));
            if c.is_abrupt() {
                return c;
            }
        }
        let subject = complete!(self, self.eval_expression(&s.right));
        if subject.is_nullish() {
            return Completion::empty();
        }
        let obj = complete!(self, self.to_object(&subject));
        let mut value = None;
        for key in self.enumerable_keys(obj) {
            // names deleted by an earlier iteration are skipped
            if !self.has_property(obj, &key) {
                continue;
            }
            let reference = match &s.left {
                ForInTarget::Variable(decl) => self.identifier_reference(&decl.name),
                ForInTarget::Expression(e) => complete!(self, self.eval_target(e)),
            };
            complete!(self, self.put_value(&reference, JsValue::from_str(&key)));
            let c = self.exec_statement(&s.body);
            if let Some(v) = c.value() {
                value = Some(v);
            }
            if !loop_continues(&c, labels) {
                return exit_loop(c, labels, value);
            }
        }
        Completion::Normal(value)
    }

    /// Each selector is evaluated at most once, in source order. Without a
    /// match, execution starts at `default` and falls through from there.
    fn exec_switch(&mut self, s: &SwitchStatement, labels: &[String]) -> Completion {
        let discriminant = complete!(self, self.eval_expression(&s.discriminant));
        let mut start = None;
        for (i, case) in s.cases.iter().enumerate() {
            let Some(test) = &case.test else {
                continue;
            };
            let selector = complete!(self, self.eval_expression(test));
            if strict_equals(&discriminant, &selector) {
                start = Some(i);
                break;
            }
        }
        let Some(start) = start.or_else(|| s.cases.iter().position(|c| c.test.is_none())) else {
            return Completion::empty();
        };
        let mut value = None;
        for case in &s.cases[start..] {
            let c = self.exec_statements(&case.consequent);
            if let Some(v) = c.value() {
                value = Some(v);
            }
            match c {
                Completion::Normal(_) => {}
                Completion::Break(None, _) => return Completion::Normal(value),
                Completion::Break(Some(l), _) if labels.contains(&l) => {
                    return Completion::Normal(value);
                }
                abrupt => return abrupt.or_value(value),
            }
        }
        Completion::Normal(value)
    }

    fn exec_try(&mut self, s: &TryStatement) -> Completion {
        let mut c = self.exec_statements(&s.block);
        if let Some(handler) = &s.handler
            && let Completion::Throw(exception) = &c
        {
            let exception = exception.clone();
            c = self.exec_catch(handler, exception);
        }
        if let Some(finalizer) = &s.finalizer {
            let f = self.exec_statements(finalizer);
            if f.is_abrupt() {
                return f;
            }
        }
        c
    }

    fn exec_catch(&mut self, handler: &CatchClause, exception: JsValue) -> Completion {
        let env = Environment::new_declarative(Some(self.lexical_env()));
        complete!(self, self.create_mutable_binding(&env, &handler.param, false));
        complete!(self, self.set_mutable_binding(&env, &handler.param, exception, false));
        self.with_lexical_env(env, |this| this.exec_statements(&handler.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> String {
        let mut interp = Interpreter::new();
        let v = interp.evaluate(src).unwrap();
        interp.display_value(&v)
    }

    #[test]
    fn statement_list_keeps_last_value() {
        assert_eq!(run("1; var x = 2;"), "1");
        assert_eq!(run("3; if (false) 4;"), "3");
        assert_eq!(run("var i = 0; while (i < 3) { i++; }"), "2");
    }

    #[test]
    fn labelled_continue_and_break() {
        let src = "var out = '';
            outer: for (var i = 0; i < 3; i++) {
                for (var j = 0; j < 3; j++) {
                    if (j == 1) continue outer;
                    if (i == 2) break outer;
                    out += i + '' + j + ',';
                }
            }
            out";
        assert_eq!(run(src), "00,10,");
        assert_eq!(run("var r = 0; block: { r = 1; break block; r = 2; } r"), "1");
    }

    #[test]
    fn jumps_keep_the_value_computed_before_them() {
        assert_eq!(run("do { 1; break; } while (false)"), "1");
        assert_eq!(run("l: { 2; break l; }"), "2");
        assert_eq!(run("switch (1) { case 1: 'a'; break; }"), "a");
        assert_eq!(run("for (var i = 0; i < 1; i++) { 'x'; continue; }"), "x");
        assert_eq!(run("outer: while (true) { 'w'; while (true) { break outer; } }"), "w");
        assert_eq!(run("var n = 0; while (true) { if (++n == 2) break; 'kept'; }"), "kept");
    }

    #[test]
    fn do_while_runs_body_first() {
        assert_eq!(run("var n = 0; do { n++; } while (false); n"), "1");
    }

    #[test]
    fn switch_falls_through_and_defaults() {
        assert_eq!(run("var r = 0; switch (2) { case 1: r += 1; case 2: r += 2; case 3: r += 3; } r"), "5");
        assert_eq!(run("var r = ''; switch (9) { case 1: r += 'a'; default: r += 'd'; case 2: r += 'b'; break; case 3: r += 'c'; } r"), "db");
    }

    #[test]
    fn switch_evaluates_selectors_once() {
        let src = "var calls = 0; function sel(v) { calls++; return v; }
            switch (5) { case sel(1): break; default: break; case sel(2): break; }
            calls";
        assert_eq!(run(src), "2");
    }

    #[test]
    fn finally_overrides() {
        assert_eq!(run("(function () { try { return 1; } finally { return 2; } })()"), "2");
        assert_eq!(run("(function () { try { throw 1; } catch (e) { return e + 1; } finally { } })()"), "2");
    }

    #[test]
    fn catch_scope_is_private() {
        assert_eq!(run("var e = 'outer'; try { throw 'inner'; } catch (e) { e; } e"), "outer");
    }

    #[test]
    fn for_in_skips_deleted_and_shadowed() {
        let src = "var p = {a: 1, b: 2}; var o = Object.create(p); o.b = 3; o.c = 4;
            var seen = []; for (var k in o) { if (k == 'c') delete p.a; seen.push(k); } seen.join()";
        assert_eq!(run(src), "b,c");
        assert_eq!(run("var n = 0; for (var k in null) n++; n"), "0");
    }

    #[test]
    fn with_statement_resolves_through_object() {
        assert_eq!(run("var o = {x: 1}; with (o) { x = 2; } o.x"), "2");
        assert_eq!(run("var o = {f: function () { return this; }}; with (o) { f() === o; }"), "true");
    }

    #[test]
    fn errors_become_catchable_exceptions() {
        assert_eq!(run("try { undefinedName; } catch (e) { e instanceof ReferenceError; }"), "true");
        assert_eq!(run("try { null.x; } catch (e) { e.name; }"), "TypeError");
    }
}
