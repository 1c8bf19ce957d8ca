use super::*;
use log::debug;

impl Interpreter {
    /// `Function(p1, ..., pn, body)`: compiles the pieces as a function
    /// expression closing over the global environment.
    fn create_dynamic_function(&mut self, args: &[JsValue]) -> JsResult<JsValue> {
        let (body, params) = match args.split_last() {
            Some((body, params)) => (self.to_string(body)?.to_rust_string(), params),
            None => (String::new(), args),
        };
        let mut names = Vec::with_capacity(params.len());
        for p in params {
            names.push(self.to_string(p)?.to_rust_string());
        }
        let source = format!("(function anonymous({}\n) {{\n{body}\n}})", names.join(","));
        debug!("compiling dynamic function: {} parameters", names.len());
        let program = parser::parse_program(&source, false).map_err(|e| JsError::syntax_error(e.message))?;
        let def = match program.body.statements.as_slice() {
            [Statement::Expression(Expression::Function(def))] => def.clone(),
            _ => return Err(JsError::syntax_error("Invalid function body")),
        };
        let global_env = self.global_env.clone();
        Ok(JsValue::Object(self.instantiate_function(&def, global_env)))
    }

    fn this_function(&self, this: &JsValue, method: &str) -> JsResult<JsObject> {
        match this {
            JsValue::Object(o) if self.get_object(*o).borrow().callable().is_some() => Ok(*o),
            other => Err(JsError::type_error(format!(
                "Function.prototype.{method} called on {}",
                self.describe_value(other)
            ))),
        }
    }

    pub(crate) fn setup_function(&mut self) {
        let proto = self.realm.function_prototype;
        self.set_function_length(proto, 0);
        self.native_constructor(
            "Function",
            1,
            Rc::new(|interp, _this, args| interp.create_dynamic_function(args)),
            Rc::new(|interp, args| interp.create_dynamic_function(args)),
            proto,
        );

        let methods: Methods = vec![
            (
                "toString",
                0,
                Rc::new(|interp, this, _args| {
                    let f = interp.this_function(this, "toString")?;
                    let text = match interp.get_object(f).borrow().callable() {
                        Some(JsFunction::User { def, .. }) => def.source_text.clone(),
                        Some(JsFunction::Native { name, .. }) => {
                            format!("function {name}() {{ [native code] }}")
                        }
                        _ => "function () { [native code] }".to_string(),
                    };
                    Ok(JsValue::from_str(&text))
                }),
            ),
            (
                "call",
                1,
                Rc::new(|interp, this, args| {
                    interp.this_function(this, "call")?;
                    let this_arg = arg(args, 0);
                    let rest = args.get(1..).unwrap_or_default();
                    interp.call(this, this_arg, rest)
                }),
            ),
            (
                "apply",
                2,
                Rc::new(|interp, this, args| {
                    interp.this_function(this, "apply")?;
                    let this_arg = arg(args, 0);
                    let list = match arg(args, 1) {
                        JsValue::Undefined | JsValue::Null => Vec::new(),
                        JsValue::Object(array) => {
                            let length = interp.get(array, "length")?;
                            let n = interp.to_uint32(&length)?;
                            let mut list = Vec::new();
                            for i in 0..n {
                                list.push(interp.get(array, &i.to_string())?);
                            }
                            list
                        }
                        _ => {
                            return Err(JsError::type_error(
                                "CreateListFromArrayLike called on non-object",
                            ));
                        }
                    };
                    interp.call(this, this_arg, &list)
                }),
            ),
            (
                "bind",
                1,
                Rc::new(|interp, this, args| {
                    let target = interp.this_function(this, "bind")?;
                    let bound_args = args.get(1..).unwrap_or_default().to_vec();
                    let target_length = match interp.get_object(target).borrow().get_property_value("length") {
                        Some(JsValue::Number(n)) => n,
                        _ => 0.0,
                    };
                    let length = (target_length - bound_args.len() as f64).max(0.0);
                    let bound = interp.create_function_object(JsFunction::Bound {
                        target,
                        bound_this: arg(args, 0),
                        bound_args,
                    });
                    let thrower = JsValue::Object(interp.realm.throw_type_error);
                    let data = interp.get_object(bound);
                    let mut data = data.borrow_mut();
                    data.insert_property(
                        "length".to_string(),
                        PropertyDescriptor::data(JsValue::Number(length), false, false, false),
                    );
                    for key in ["caller", "arguments"] {
                        data.insert_property(
                            key.to_string(),
                            PropertyDescriptor::accessor(thrower.clone(), thrower.clone(), false, false),
                        );
                    }
                    Ok(JsValue::Object(bound))
                }),
            ),
        ];
        self.define_methods(proto, methods);
    }
}
