use super::*;

mod array;
mod boolean;
mod console;
mod date;
mod error;
mod function;
pub(crate) mod global;
mod math;
mod number;
mod object;
pub(crate) mod regexp;
mod string;

/// Table of `(name, length, behaviour)` entries installed on one object.
pub(crate) type Methods = Vec<(&'static str, usize, NativeFn)>;

/// Argument `i`, `undefined` when the caller passed fewer.
pub(crate) fn arg(args: &[JsValue], i: usize) -> JsValue {
    args.get(i).cloned().unwrap_or(JsValue::Undefined)
}

impl Interpreter {
    pub(crate) fn setup_globals(&mut self) {
        let thrower = self.realm.throw_type_error;
        self.set_function_length(thrower, 0);
        let eval = self.realm.eval_function;
        self.set_function_length(eval, 1);

        self.setup_object();
        self.setup_function();
        self.setup_array();
        self.setup_string();
        self.setup_boolean();
        self.setup_number();
        self.setup_math();
        self.setup_date();
        self.setup_regexp();
        self.setup_errors();
        self.setup_global_functions();
        self.setup_console();
    }

    fn set_function_length(&mut self, f: JsObject, arity: usize) {
        self.get_object(f).borrow_mut().insert_property(
            "length".to_string(),
            PropertyDescriptor::data(JsValue::Number(arity as f64), false, false, false),
        );
    }

    /// A builtin function object that cannot be used with `new`.
    pub(crate) fn native_function(&mut self, name: &str, arity: usize, call: NativeFn) -> JsObject {
        let f = self.create_function_object(JsFunction::Native {
            name: name.to_string(),
            arity,
            call,
            construct: None,
        });
        self.set_function_length(f, arity);
        f
    }

    /// A builtin constructor wired to `prototype`, installed on the global object.
    pub(crate) fn native_constructor(
        &mut self,
        name: &str,
        arity: usize,
        call: NativeFn,
        construct: NativeConstructFn,
        prototype: JsObject,
    ) -> JsObject {
        let ctor = self.create_function_object(JsFunction::Native {
            name: name.to_string(),
            arity,
            call,
            construct: Some(construct),
        });
        self.set_function_length(ctor, arity);
        self.get_object(ctor).borrow_mut().insert_property(
            "prototype".to_string(),
            PropertyDescriptor::data(JsValue::Object(prototype), false, false, false),
        );
        self.get_object(prototype)
            .borrow_mut()
            .insert_builtin("constructor".to_string(), JsValue::Object(ctor));
        self.define_global(name, JsValue::Object(ctor));
        ctor
    }

    pub(crate) fn define_methods(&mut self, target: JsObject, methods: Methods) {
        for (name, arity, call) in methods {
            let f = self.native_function(name, arity, call);
            self.get_object(target)
                .borrow_mut()
                .insert_builtin(name.to_string(), JsValue::Object(f));
        }
    }

    /// Read-only, non-enumerable, non-configurable data properties.
    pub(crate) fn define_constants(&mut self, target: JsObject, constants: &[(&str, JsValue)]) {
        let data = self.get_object(target);
        let mut data = data.borrow_mut();
        for (name, value) in constants {
            data.insert_property(
                name.to_string(),
                PropertyDescriptor::data(value.clone(), false, false, false),
            );
        }
    }

    pub(crate) fn define_global(&mut self, name: &str, value: JsValue) {
        let global = self.realm.global_object;
        self.get_object(global)
            .borrow_mut()
            .insert_builtin(name.to_string(), value);
    }

    /// The callable at `args[i]`, or a TypeError naming `method`.
    pub(crate) fn callback_arg(&self, args: &[JsValue], i: usize, method: &str) -> JsResult<JsValue> {
        let f = arg(args, i);
        if self.is_callable(&f) {
            Ok(f)
        } else {
            Err(JsError::type_error(format!(
                "{} is not a function (in {method})",
                self.describe_value(&f)
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_attributes() {
        let mut interp = Interpreter::new();
        let global = interp.realm.global_object;
        let object_ctor = interp.get_own_property(global, "Object").unwrap();
        assert!(object_ctor.writable() && !object_ctor.enumerable() && object_ctor.configurable());
        let nan = interp.get_own_property(global, "NaN").unwrap();
        assert!(!nan.writable() && !nan.configurable());
        let proto = interp.realm.array_prototype;
        let push = interp.get_own_property(proto, "push").unwrap();
        assert!(!push.enumerable());
        let push = push.value.and_then(|v| v.as_object()).unwrap();
        let length = interp.get_own_property(push, "length").unwrap();
        assert!(matches!(length.value, Some(JsValue::Number(n)) if n == 1.0));
    }

    #[test]
    fn constructors_link_prototypes() {
        let mut interp = Interpreter::new();
        let v = interp
            .evaluate("Array.prototype.constructor === Array && Object.getPrototypeOf(Function) === Function.prototype")
            .unwrap();
        assert!(matches!(v, JsValue::Boolean(true)));
    }
}
