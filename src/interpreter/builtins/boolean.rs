use super::*;

impl Interpreter {
    fn this_boolean_value(&self, this: &JsValue, method: &str) -> JsResult<bool> {
        match this {
            JsValue::Boolean(b) => Ok(*b),
            JsValue::Object(o) => match self.get_object(*o).borrow().kind {
                ObjectKind::Boolean(b) => Ok(b),
                _ => Err(JsError::type_error(format!("Boolean.prototype.{method} requires a Boolean"))),
            },
            _ => Err(JsError::type_error(format!("Boolean.prototype.{method} requires a Boolean"))),
        }
    }

    pub(crate) fn setup_boolean(&mut self) {
        let proto = self.realm.boolean_prototype;
        self.native_constructor(
            "Boolean",
            1,
            Rc::new(|_interp, _this, args| Ok(JsValue::Boolean(to_boolean(&arg(args, 0))))),
            Rc::new(|interp, args| {
                let b = to_boolean(&arg(args, 0));
                let data = JsObjectData::with_kind(Some(interp.realm.boolean_prototype), "Boolean", ObjectKind::Boolean(b));
                Ok(JsValue::Object(interp.alloc(data)))
            }),
            proto,
        );

        let methods: Methods = vec![
            (
                "toString",
                0,
                Rc::new(|interp, this, _args| {
                    let b = interp.this_boolean_value(this, "toString")?;
                    Ok(JsValue::from_str(if b { "true" } else { "false" }))
                }),
            ),
            (
                "valueOf",
                0,
                Rc::new(|interp, this, _args| Ok(JsValue::Boolean(interp.this_boolean_value(this, "valueOf")?))),
            ),
        ];
        self.define_methods(proto, methods);
    }
}
