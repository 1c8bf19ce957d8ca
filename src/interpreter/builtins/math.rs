use super::*;

fn round(x: f64) -> f64 {
    if !x.is_finite() || x == 0.0 || x.fract() == 0.0 {
        return x;
    }
    if (-0.5..0.0).contains(&x) {
        return -0.0;
    }
    (x + 0.5).floor()
}

fn pow(x: f64, y: f64) -> f64 {
    if y.is_nan() || (x.abs() == 1.0 && y.is_infinite()) {
        return f64::NAN;
    }
    x.powf(y)
}

impl Interpreter {
    /// xorshift64* step over the engine's seed, scaled into [0, 1).
    fn next_random(&mut self) -> f64 {
        let mut x = self.rng_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng_state = x;
        let bits = x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11;
        bits as f64 / (1u64 << 53) as f64
    }

    fn numeric_args(&mut self, args: &[JsValue]) -> JsResult<Vec<f64>> {
        let mut values = Vec::with_capacity(args.len());
        for a in args {
            values.push(self.to_number(a)?);
        }
        Ok(values)
    }

    pub(crate) fn setup_math(&mut self) {
        let math = self.create_object();
        self.get_object(math).borrow_mut().class_name = "Math";
        self.define_constants(
            math,
            &[
                ("E", JsValue::Number(std::f64::consts::E)),
                ("LN10", JsValue::Number(std::f64::consts::LN_10)),
                ("LN2", JsValue::Number(std::f64::consts::LN_2)),
                ("LOG2E", JsValue::Number(std::f64::consts::LOG2_E)),
                ("LOG10E", JsValue::Number(std::f64::consts::LOG10_E)),
                ("PI", JsValue::Number(std::f64::consts::PI)),
                ("SQRT1_2", JsValue::Number(std::f64::consts::FRAC_1_SQRT_2)),
                ("SQRT2", JsValue::Number(std::f64::consts::SQRT_2)),
            ],
        );

        let unary: [(&'static str, fn(f64) -> f64); 13] = [
            ("abs", f64::abs),
            ("acos", f64::acos),
            ("asin", f64::asin),
            ("atan", f64::atan),
            ("ceil", f64::ceil),
            ("cos", f64::cos),
            ("exp", f64::exp),
            ("floor", f64::floor),
            ("log", f64::ln),
            ("round", round),
            ("sin", f64::sin),
            ("sqrt", f64::sqrt),
            ("tan", f64::tan),
        ];
        let mut methods: Methods = unary
            .into_iter()
            .map(|(name, op)| {
                let call: NativeFn = Rc::new(move |interp, _this, args| Ok(JsValue::Number(op(interp.to_number(&arg(args, 0))?))));
                (name, 1, call)
            })
            .collect();
        methods.extend::<Methods>(vec![
            (
                "atan2",
                2,
                Rc::new(|interp, _this, args| {
                    let y = interp.to_number(&arg(args, 0))?;
                    let x = interp.to_number(&arg(args, 1))?;
                    Ok(JsValue::Number(y.atan2(x)))
                }),
            ),
            (
                "pow",
                2,
                Rc::new(|interp, _this, args| {
                    let x = interp.to_number(&arg(args, 0))?;
                    let y = interp.to_number(&arg(args, 1))?;
                    Ok(JsValue::Number(pow(x, y)))
                }),
            ),
            (
                "max",
                2,
                Rc::new(|interp, _this, args| {
                    let values = interp.numeric_args(args)?;
                    let mut best = f64::NEG_INFINITY;
                    for n in values {
                        if n.is_nan() {
                            return Ok(JsValue::Number(f64::NAN));
                        }
                        if n > best || (n == 0.0 && best == 0.0 && best.is_sign_negative()) {
                            best = n;
                        }
                    }
                    Ok(JsValue::Number(best))
                }),
            ),
            (
                "min",
                2,
                Rc::new(|interp, _this, args| {
                    let values = interp.numeric_args(args)?;
                    let mut best = f64::INFINITY;
                    for n in values {
                        if n.is_nan() {
                            return Ok(JsValue::Number(f64::NAN));
                        }
                        if n < best || (n == 0.0 && best == 0.0 && n.is_sign_negative()) {
                            best = n;
                        }
                    }
                    Ok(JsValue::Number(best))
                }),
            ),
            ("random", 0, Rc::new(|interp, _this, _args| Ok(JsValue::Number(interp.next_random())))),
        ]);
        self.define_methods(math, methods);
        self.define_global("Math", JsValue::Object(math));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> String {
        let mut interp = Interpreter::new();
        match interp.evaluate(src) {
            Ok(v) => interp.display_value(&v),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn rounding_edge_cases() {
        assert_eq!(round(2.5), 3.0);
        assert_eq!(round(-2.5), -2.0);
        assert!(round(-0.4).is_sign_negative());
        assert_eq!(round(1e300), 1e300);
        assert!(pow(1.0, f64::NAN).is_nan());
        assert!(pow(-1.0, f64::INFINITY).is_nan());
        assert_eq!(pow(f64::NAN, 0.0), 1.0);
    }

    #[test]
    fn functions_and_constants() {
        assert_eq!(run("Math.max(1, 3, 2) + Math.min(4, -1)"), "2");
        assert_eq!(run("Math.max()"), "-Infinity");
        assert_eq!(run("isNaN(Math.max(1, 'x'))"), "true");
        assert_eq!(run("1 / Math.max(-0, 0)"), "Infinity");
        assert_eq!(run("1 / Math.min(0, -0)"), "-Infinity");
        assert_eq!(run("Math.floor(-1.5) + ',' + Math.ceil(1.2) + ',' + Math.abs(-3)"), "-2,2,3");
        assert_eq!(run("Math.PI = 3; Math.PI > 3.14"), "true");
        assert_eq!(run("Object.prototype.toString.call(Math)"), "[object Math]");
        assert_eq!(run("Math.max.length + ',' + Math.sqrt(16)"), "2,4");
    }

    #[test]
    fn random_stays_in_unit_interval() {
        assert_eq!(
            run("var ok = true; for (var i = 0; i < 200; i++) { var r = Math.random(); if (!(r >= 0 && r < 1)) ok = false; } ok"),
            "true"
        );
    }
}
