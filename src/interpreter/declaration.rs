use super::*;
use rustc_hash::FxHashSet;

impl Interpreter {
    /// Binding instantiation on entry to function code: parameters, function
    /// declarations, `arguments`, then `var` names.
    pub(crate) fn instantiate_function_declarations(
        &mut self,
        f: JsObject,
        def: &Rc<FunctionDefinition>,
        args: &[JsValue],
    ) -> JsResult<()> {
        let env = self.context().variable_env.clone();
        let strict = self.is_strict();
        for (i, name) in def.params.iter().enumerate() {
            if !self.has_binding(&env, name) {
                self.create_mutable_binding(&env, name, false)?;
            }
            let value = args.get(i).cloned().unwrap_or(JsValue::Undefined);
            self.set_mutable_binding(&env, name, value, strict)?;
        }
        self.declare_functions(&def.body, false)?;
        if !self.has_binding(&env, "arguments") {
            let arguments = self.create_arguments_object(f, &def.params, args, &env, strict);
            if strict {
                self.create_immutable_binding(&env, "arguments");
                self.initialize_immutable_binding(&env, "arguments", JsValue::Object(arguments));
            } else {
                self.create_mutable_binding(&env, "arguments", false)?;
                self.set_mutable_binding(&env, "arguments", JsValue::Object(arguments), false)?;
            }
        }
        self.declare_vars(&def.body, false)
    }

    /// Binding instantiation on entry to global or eval code. Eval code creates
    /// deletable bindings.
    pub(crate) fn instantiate_global_declarations(
        &mut self,
        body: &FunctionBody,
        is_eval: bool,
    ) -> JsResult<()> {
        self.declare_functions(body, is_eval)?;
        self.declare_vars(body, is_eval)
    }

    fn declare_functions(&mut self, body: &FunctionBody, configurable: bool) -> JsResult<()> {
        let env = self.context().variable_env.clone();
        let strict = self.is_strict();
        let is_global = Rc::ptr_eq(&env, &self.global_env);
        for def in &body.function_declarations {
            let Some(name) = def.name.as_deref() else {
                continue;
            };
            let f = self.instantiate_function(def, env.clone());
            if !self.has_binding(&env, name) {
                self.create_mutable_binding(&env, name, configurable)?;
            } else if is_global {
                let global = self.realm.global_object;
                let existing = self.get_property(global, name).unwrap_or_default();
                if existing.configurable() {
                    let replacement =
                        PropertyDescriptor::data(JsValue::Undefined, true, true, configurable);
                    self.define_own_property(global, name, replacement, true)?;
                } else if existing.is_accessor_descriptor()
                    || !(existing.writable() && existing.enumerable())
                {
                    return Err(JsError::type_error(format!(
                        "Cannot redefine global function '{name}'"
                    )));
                }
            }
            self.set_mutable_binding(&env, name, JsValue::Object(f), strict)?;
        }
        Ok(())
    }

    fn declare_vars(&mut self, body: &FunctionBody, configurable: bool) -> JsResult<()> {
        let env = self.context().variable_env.clone();
        for name in &body.var_names {
            if !self.has_binding(&env, name) {
                self.create_mutable_binding(&env, name, configurable)?;
            }
        }
        Ok(())
    }

    /// Builds the `arguments` object for a call. In non-strict code each index
    /// below both the argument count and the parameter count aliases the
    /// parameter binding; the last parameter of a repeated name wins.
    fn create_arguments_object(
        &mut self,
        callee: JsObject,
        params: &[String],
        args: &[JsValue],
        env: &EnvRef,
        strict: bool,
    ) -> JsObject {
        let mut mapped = FxHashMap::default();
        if !strict {
            let mut seen: FxHashSet<&str> = FxHashSet::default();
            for i in (0..params.len().min(args.len())).rev() {
                let name = params[i].as_str();
                if seen.insert(name) {
                    mapped.insert(i.to_string(), name.to_string());
                }
            }
        }
        let mut data = JsObjectData::with_kind(
            Some(self.realm.object_prototype),
            "Arguments",
            ObjectKind::Arguments(ArgumentsMap {
                env: env.clone(),
                mapped,
            }),
        );
        data.insert_property(
            "length".to_string(),
            PropertyDescriptor::builtin(JsValue::Number(args.len() as f64)),
        );
        for (i, v) in args.iter().enumerate() {
            data.insert_value(i.to_string(), v.clone());
        }
        if strict {
            let thrower = JsValue::Object(self.realm.throw_type_error);
            for key in ["callee", "caller"] {
                data.insert_property(
                    key.to_string(),
                    PropertyDescriptor::accessor(thrower.clone(), thrower.clone(), false, false),
                );
            }
        } else {
            data.insert_property(
                "callee".to_string(),
                PropertyDescriptor::builtin(JsValue::Object(callee)),
            );
        }
        self.alloc(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_number(src: &str) -> f64 {
        let mut interp = Interpreter::new();
        match interp.evaluate(src).unwrap() {
            JsValue::Number(n) => n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    fn eval_string(src: &str) -> String {
        let mut interp = Interpreter::new();
        let v = interp.evaluate(src).unwrap();
        interp.display_value(&v)
    }

    #[test]
    fn functions_are_hoisted_over_vars() {
        assert_eq!(eval_string("var f = 1; function f() {} typeof f"), "number");
        assert_eq!(eval_string("typeof g; function g() {}"), "function");
        assert_eq!(eval_string("(function () { return typeof h; var h; function h() {} })()"), "function");
    }

    #[test]
    fn missing_arguments_bind_undefined() {
        assert_eq!(eval_string("(function (a, b) { return typeof b; })(1)"), "undefined");
    }

    #[test]
    fn duplicate_parameters_last_wins() {
        assert_eq!(eval_number("(function (a, a) { return a; })(1, 2)"), 2.0);
        assert_eq!(eval_number("(function (a, a) { arguments[1] = 5; return a; })(1, 2)"), 5.0);
    }

    #[test]
    fn arguments_alias_parameters() {
        assert_eq!(eval_number("(function (a) { arguments[0] = 9; return a; })(1)"), 9.0);
        assert_eq!(eval_number("(function (a) { a = 3; return arguments[0]; })(1)"), 3.0);
        assert_eq!(
            eval_string("(function (a) { arguments[0] = 9; return typeof a; })()"),
            "undefined"
        );
    }

    #[test]
    fn deleting_an_index_severs_the_alias() {
        assert_eq!(
            eval_number("(function (a) { delete arguments[0]; arguments[0] = 4; return a; })(1)"),
            1.0
        );
    }

    #[test]
    fn strict_arguments_are_unmapped() {
        assert_eq!(
            eval_number("(function (a) { 'use strict'; arguments[0] = 9; return a; })(1)"),
            1.0
        );
        let mut interp = Interpreter::new();
        assert!(
            interp
                .evaluate("(function () { 'use strict'; return arguments.callee; })()")
                .is_err()
        );
    }

    #[test]
    fn existing_arguments_binding_is_kept() {
        assert_eq!(eval_number("(function (arguments) { return arguments; })(7)"), 7.0);
        assert_eq!(eval_string("(function () { function arguments() {} return typeof arguments; })()"), "function");
    }
}
