use super::*;

const NATIVE_ERRORS: [ErrorKind; 6] = [
    ErrorKind::Eval,
    ErrorKind::Range,
    ErrorKind::Reference,
    ErrorKind::Syntax,
    ErrorKind::Type,
    ErrorKind::Uri,
];

impl Interpreter {
    /// A fresh Error object of `kind` carrying `message`.
    pub(crate) fn create_error(&mut self, kind: ErrorKind, message: &str) -> JsObject {
        let prototype = self.realm.error_prototype_for(kind);
        let mut data = JsObjectData::with_kind(Some(prototype), "Error", ObjectKind::Error);
        data.insert_builtin("message".to_string(), JsValue::from_str(message));
        self.alloc(data)
    }

    /// The script-visible value of an engine error.
    pub(crate) fn error_to_value(&mut self, err: JsError) -> JsValue {
        match err {
            JsError::Native { kind, message } => JsValue::Object(self.create_error(kind, &message)),
            JsError::Thrown(v) => v,
        }
    }

    fn construct_error(&mut self, kind: ErrorKind, args: &[JsValue]) -> JsResult<JsValue> {
        let prototype = self.realm.error_prototype_for(kind);
        let mut data = JsObjectData::with_kind(Some(prototype), "Error", ObjectKind::Error);
        let message = arg(args, 0);
        if !message.is_undefined() {
            let message = self.to_string(&message)?;
            data.insert_builtin("message".to_string(), JsValue::String(message));
        }
        Ok(JsValue::Object(self.alloc(data)))
    }

    pub(crate) fn setup_errors(&mut self) {
        for kind in std::iter::once(ErrorKind::Native).chain(NATIVE_ERRORS) {
            let prototype = self.realm.error_prototype_for(kind);
            {
                let data = self.get_object(prototype);
                let mut data = data.borrow_mut();
                data.insert_builtin("name".to_string(), JsValue::from_str(kind.name()));
                data.insert_builtin("message".to_string(), JsValue::from_str(""));
            }
            self.native_constructor(
                kind.name(),
                1,
                Rc::new(move |interp, _this, args| interp.construct_error(kind, args)),
                Rc::new(move |interp, args| interp.construct_error(kind, args)),
                prototype,
            );
        }

        let methods: Methods = vec![(
            "toString",
            0,
            Rc::new(|interp, this, _args| {
                let JsValue::Object(o) = this else {
                    return Err(JsError::type_error(
                        "Error.prototype.toString called on non-object",
                    ));
                };
                let name = match interp.get(*o, "name")? {
                    JsValue::Undefined => JsString::from_str("Error"),
                    v => interp.to_string(&v)?,
                };
                let message = match interp.get(*o, "message")? {
                    JsValue::Undefined => JsString::default(),
                    v => interp.to_string(&v)?,
                };
                let rendered = if name.is_empty() {
                    message
                } else if message.is_empty() {
                    name
                } else {
                    name.concat(&JsString::from_str(": ")).concat(&message)
                };
                Ok(JsValue::String(rendered))
            }),
        )];
        let proto = self.realm.error_prototype;
        self.define_methods(proto, methods);
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
    fn native_errors_chain_to_error() {
        assert_eq!(
            run("var e = new TypeError('x'); e instanceof TypeError && e instanceof Error"),
            "true"
        );
        assert_eq!(
            run("Object.getPrototypeOf(RangeError.prototype) === Error.prototype"),
            "true"
        );
        assert_eq!(run("RangeError.prototype.name"), "RangeError");
    }

    #[test]
    fn message_is_own_only_when_given() {
        assert_eq!(run("new Error('m').hasOwnProperty('message')"), "true");
        assert_eq!(run("new Error().hasOwnProperty('message')"), "false");
        assert_eq!(run("Error('called').message"), "called");
    }

    #[test]
    fn to_string_forms() {
        assert_eq!(run("String(new Error('boom'))"), "Error: boom");
        assert_eq!(run("String(new URIError())"), "URIError");
        assert_eq!(
            run("var e = new Error('m'); e.name = ''; e.toString()"),
            "m"
        );
        assert_eq!(
            run("Error.prototype.toString.call({name: 'Custom', message: 'c'})"),
            "Custom: c"
        );
    }

    #[test]
    fn engine_errors_materialize_with_their_kind() {
        assert_eq!(
            run("try { null.x; } catch (e) { e instanceof TypeError && e.constructor === TypeError }"),
            "true"
        );
        assert_eq!(
            run("try { missing; } catch (e) { e.name + ': ' + e.message }"),
            "ReferenceError: missing is not defined"
        );
    }
}
