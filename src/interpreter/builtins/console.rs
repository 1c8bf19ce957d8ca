use super::*;

impl Interpreter {
    pub(crate) fn setup_console(&mut self) {
        let console = self.create_object();
        let methods: Methods = vec![(
            "log",
            0,
            Rc::new(|interp, _this, args| {
                let mut parts = Vec::with_capacity(args.len());
                for v in args {
                    parts.push(interp.to_string(v)?.to_rust_string());
                }
                interp.write_line(parts.join(" "));
                Ok(JsValue::Undefined)
            }),
        )];
        self.define_methods(console, methods);
        self.define_global("console", JsValue::Object(console));
    }
}
