use super::*;
use log::trace;

impl Interpreter {
    pub(crate) fn is_callable(&self, v: &JsValue) -> bool {
        match v {
            JsValue::Object(o) => self.get_object(*o).borrow().callable().is_some(),
            _ => false,
        }
    }

    fn function_of(&self, o: JsObject) -> Option<JsFunction> {
        self.get_object(o).borrow().callable().cloned()
    }

    /// Creates the function object for a declaration or expression closing over `scope`.
    pub(crate) fn instantiate_function(
        &mut self,
        def: &Rc<FunctionDefinition>,
        scope: EnvRef,
    ) -> JsObject {
        let strict = def.body.strict;
        let f = self.create_function_object(JsFunction::User {
            def: def.clone(),
            closure: scope,
            strict,
        });
        let prototype = self.create_object();
        self.get_object(prototype).borrow_mut().insert_property(
            "constructor".to_string(),
            PropertyDescriptor::data(JsValue::Object(f), true, false, true),
        );
        let data = self.get_object(f);
        let mut data = data.borrow_mut();
        data.insert_property(
            "length".to_string(),
            PropertyDescriptor::data(JsValue::Number(def.params.len() as f64), false, false, false),
        );
        data.insert_property(
            "prototype".to_string(),
            PropertyDescriptor::data(JsValue::Object(prototype), true, false, false),
        );
        if strict {
            let thrower = JsValue::Object(self.realm.throw_type_error);
            for key in ["caller", "arguments"] {
                data.insert_property(
                    key.to_string(),
                    PropertyDescriptor::accessor(thrower.clone(), thrower.clone(), false, false),
                );
            }
        }
        f
    }

    /// A function expression; a named one sees its own name through an
    /// immutable binding in an environment of its own.
    pub(crate) fn instantiate_function_expression(&mut self, def: &Rc<FunctionDefinition>) -> JsObject {
        let scope = self.lexical_env();
        let Some(name) = &def.name else {
            return self.instantiate_function(def, scope);
        };
        let env = Environment::new_declarative(Some(scope));
        self.create_immutable_binding(&env, name);
        let f = self.instantiate_function(def, env.clone());
        self.initialize_immutable_binding(&env, name, JsValue::Object(f));
        f
    }

    pub(crate) fn call(&mut self, callee: &JsValue, this: JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let func = match callee {
            JsValue::Object(o) => self.function_of(*o).map(|f| (*o, f)),
            _ => None,
        };
        let Some((o, func)) = func else {
            return Err(JsError::type_error(format!(
                "{} is not a function",
                self.describe_value(callee)
            )));
        };
        match func {
            JsFunction::User { def, closure, strict } => {
                self.call_user_function(o, &def, closure, strict, this, args)
            }
            JsFunction::Native { call, .. } => call(self, &this, args),
            JsFunction::Bound {
                target,
                bound_this,
                bound_args,
            } => {
                let mut full = bound_args;
                full.extend_from_slice(args);
                self.call(&JsValue::Object(target), bound_this, &full)
            }
        }
    }

    fn call_user_function(
        &mut self,
        f: JsObject,
        def: &Rc<FunctionDefinition>,
        closure: EnvRef,
        strict: bool,
        this: JsValue,
        args: &[JsValue],
    ) -> JsResult<JsValue> {
        trace!(
            "call {} with {} args",
            def.name.as_deref().unwrap_or("<anonymous>"),
            args.len()
        );
        let this_binding = if strict {
            this
        } else {
            match this {
                JsValue::Undefined | JsValue::Null => JsValue::Object(self.realm.global_object),
                JsValue::Object(o) => JsValue::Object(o),
                primitive => JsValue::Object(self.to_object(&primitive)?),
            }
        };
        let env = Environment::new_declarative(Some(closure));
        self.push_context(ExecutionContext::new(env, this_binding, strict));
        let outcome = self
            .instantiate_function_declarations(f, def, args)
            .map(|()| self.exec_statements(&def.body.statements));
        self.pop_context();
        match outcome? {
            Completion::Return(v) => Ok(v),
            Completion::Throw(v) => Err(JsError::Thrown(v)),
            _ => Ok(JsValue::Undefined),
        }
    }

    pub(crate) fn construct(&mut self, callee: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let func = match callee {
            JsValue::Object(o) => self.function_of(*o).map(|f| (*o, f)),
            _ => None,
        };
        let not_constructor =
            |this: &Self| JsError::type_error(format!("{} is not a constructor", this.describe_value(callee)));
        let Some((o, func)) = func else {
            return Err(not_constructor(&*self));
        };
        match func {
            JsFunction::User { .. } => {
                let prototype = match self.get(o, "prototype")? {
                    JsValue::Object(p) => p,
                    _ => self.realm.object_prototype,
                };
                let obj = self.alloc(JsObjectData::new(Some(prototype)));
                let result = self.call(callee, JsValue::Object(obj), args)?;
                Ok(if result.is_object() {
                    result
                } else {
                    JsValue::Object(obj)
                })
            }
            JsFunction::Native {
                construct: Some(construct),
                ..
            } => construct(self, args),
            JsFunction::Native { construct: None, .. } => Err(not_constructor(&*self)),
            JsFunction::Bound {
                target, bound_args, ..
            } => {
                let mut full = bound_args;
                full.extend_from_slice(args);
                self.construct(&JsValue::Object(target), &full)
            }
        }
    }

    pub(crate) fn has_instance(&mut self, f: JsObject, v: &JsValue) -> JsResult<bool> {
        match self.function_of(f) {
            None => {
                return Err(JsError::type_error(
                    "Right-hand side of 'instanceof' is not callable",
                ));
            }
            Some(JsFunction::Bound { target, .. }) => return self.has_instance(target, v),
            Some(_) => {}
        }
        let mut current = match v {
            JsValue::Object(o) => *o,
            _ => return Ok(false),
        };
        let JsValue::Object(prototype) = self.get(f, "prototype")? else {
            return Err(JsError::type_error(
                "Function has non-object prototype in instanceof check",
            ));
        };
        loop {
            let next = self.get_object(current).borrow().prototype;
            match next {
                None => return Ok(false),
                Some(p) if p == prototype => return Ok(true),
                Some(p) => current = p,
            }
        }
    }

    /// Short description of a value for error messages.
    pub(crate) fn describe_value(&self, v: &JsValue) -> String {
        match v {
            JsValue::String(s) => format!("\"{s}\""),
            JsValue::Object(o) => {
                if self.get_object(*o).borrow().callable().is_some() {
                    "function".to_string()
                } else {
                    "object".to_string()
                }
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(interp: &mut Interpreter, src: &str) -> JsValue {
        interp.evaluate(src).unwrap()
    }

    #[test]
    fn function_object_shape() {
        let mut interp = Interpreter::new();
        let f = eval(&mut interp, "(function (a, b) {})").as_object().unwrap();
        let length = interp.get_own_property(f, "length").unwrap();
        assert!(matches!(length.value, Some(JsValue::Number(n)) if n == 2.0));
        assert!(!length.writable() && !length.configurable());
        let proto = interp.get_own_property(f, "prototype").unwrap();
        assert!(proto.writable() && !proto.enumerable());
        let proto = proto.value.and_then(|v| v.as_object()).unwrap();
        let ctor = interp.get_own_property(proto, "constructor").unwrap();
        assert!(matches!(ctor.value, Some(JsValue::Object(o)) if o == f));
    }

    #[test]
    fn strict_functions_poison_caller() {
        let mut interp = Interpreter::new();
        let f = eval(&mut interp, "(function () { 'use strict'; })").as_object().unwrap();
        let caller = interp.get_own_property(f, "caller").unwrap();
        assert!(caller.is_accessor_descriptor());
        assert!(interp.get(f, "caller").is_err());
    }

    #[test]
    fn this_coercion() {
        let mut interp = Interpreter::new();
        let v = eval(&mut interp, "(function () { return typeof this; }).call(5)");
        assert!(matches!(v, JsValue::String(s) if s.to_rust_string() == "object"));
        let v = eval(&mut interp, "(function () { 'use strict'; return typeof this; }).call(5)");
        assert!(matches!(v, JsValue::String(s) if s.to_rust_string() == "number"));
        let v = eval(&mut interp, "(function () { return this; })() === this");
        assert!(matches!(v, JsValue::Boolean(true)));
    }

    #[test]
    fn construct_uses_object_results_only() {
        let mut interp = Interpreter::new();
        let v = eval(
            &mut interp,
            "function P() { this.x = 1; return 5; } function Q() { return {y: 2}; } new P().x + new Q().y",
        );
        assert!(matches!(v, JsValue::Number(n) if n == 3.0));
    }

    #[test]
    fn bound_functions_forward() {
        let mut interp = Interpreter::new();
        let v = eval(
            &mut interp,
            "function A(a, b) { this.s = a + b; } var B = A.bind(null, 1); var b = new B(2); b.s === 3 && b instanceof A && b instanceof B",
        );
        assert!(matches!(v, JsValue::Boolean(true)));
    }

    #[test]
    fn calling_non_callable_is_type_error() {
        let mut interp = Interpreter::new();
        assert!(matches!(
            interp.call(&JsValue::Number(1.0), JsValue::Undefined, &[]),
            Err(JsError::Native {
                kind: ErrorKind::Type,
                ..
            })
        ));
    }
}
