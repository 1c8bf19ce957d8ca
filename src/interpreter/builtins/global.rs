use super::*;
use log::debug;

/// `eval` reached through anything other than a direct call: global scope,
/// global `this`, non-strict unless the code itself opts in.
pub(crate) fn indirect_eval(interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    let JsValue::String(source) = arg(args, 0) else {
        return Ok(arg(args, 0));
    };
    debug!("indirect eval of {} code units", source.len());
    let program = parse_eval_source(&source, false)?;
    let global_env = interp.global_env.clone();
    let env = if program.body.strict {
        Environment::new_declarative(Some(global_env))
    } else {
        global_env
    };
    let this = JsValue::Object(interp.realm.global_object);
    let ctx = ExecutionContext::new(env, this, program.body.strict);
    interp.run_eval_code(ctx, &program.body)
}

fn parse_eval_source(source: &JsString, strict: bool) -> JsResult<Program> {
    parser::parse_program(&source.to_rust_string(), strict)
        .map_err(|e| JsError::syntax_error(e.message))
}

impl Interpreter {
    /// A call written `eval(...)` whose callee is the builtin eval: runs in the
    /// caller's environments with the caller's `this`.
    pub(crate) fn direct_eval(&mut self, args: &[JsValue]) -> JsResult<JsValue> {
        let JsValue::String(source) = arg(args, 0) else {
            return Ok(arg(args, 0));
        };
        let caller_strict = self.is_strict();
        debug!(
            "direct eval of {} code units, caller strict={caller_strict}",
            source.len()
        );
        let program = parse_eval_source(&source, caller_strict)?;
        let caller = self.context();
        let this = caller.this_binding.clone();
        let lexical_env = caller.lexical_env.clone();
        let variable_env = caller.variable_env.clone();
        let ctx = if program.body.strict {
            let env = Environment::new_declarative(Some(lexical_env));
            ExecutionContext::new(env, this, true)
        } else {
            let mut ctx = ExecutionContext::new(variable_env, this, false);
            ctx.lexical_env = lexical_env;
            ctx
        };
        self.run_eval_code(ctx, &program.body)
    }

    fn run_eval_code(&mut self, ctx: ExecutionContext, body: &Rc<FunctionBody>) -> JsResult<JsValue> {
        self.push_context(ctx);
        let completion = match self.instantiate_global_declarations(body, true) {
            Ok(()) => self.exec_statements(&body.statements),
            Err(err) => Completion::Throw(self.error_to_value(err)),
        };
        self.pop_context();
        match completion {
            Completion::Normal(v) => Ok(v.unwrap_or(JsValue::Undefined)),
            Completion::Throw(v) => Err(JsError::Thrown(v)),
            _ => Ok(JsValue::Undefined),
        }
    }

    pub(crate) fn setup_global_functions(&mut self) {
        let global = self.realm.global_object;
        self.define_constants(
            global,
            &[
                ("NaN", JsValue::Number(f64::NAN)),
                ("Infinity", JsValue::Number(f64::INFINITY)),
                ("undefined", JsValue::Undefined),
            ],
        );
        self.define_global("eval", JsValue::Object(self.realm.eval_function));

        let methods: Methods = vec![
            (
                "parseInt",
                2,
                Rc::new(|interp, _this, args| {
                    let input = interp.to_string(&arg(args, 0))?.to_rust_string();
                    let radix = interp.to_int32(&arg(args, 1))?;
                    Ok(JsValue::Number(parse_int(&input, radix)))
                }),
            ),
            (
                "parseFloat",
                1,
                Rc::new(|interp, _this, args| {
                    let input = interp.to_string(&arg(args, 0))?.to_rust_string();
                    Ok(JsValue::Number(parse_float(&input)))
                }),
            ),
            (
                "isNaN",
                1,
                Rc::new(|interp, _this, args| {
                    Ok(JsValue::Boolean(interp.to_number(&arg(args, 0))?.is_nan()))
                }),
            ),
            (
                "isFinite",
                1,
                Rc::new(|interp, _this, args| {
                    Ok(JsValue::Boolean(interp.to_number(&arg(args, 0))?.is_finite()))
                }),
            ),
        ];
        self.define_methods(global, methods);
    }
}

/// parseInt over an already converted string (15.1.2.2).
fn parse_int(input: &str, radix: i32) -> f64 {
    let s = input.trim_start_matches(is_str_whitespace);
    let (sign, s) = match s.chars().next() {
        Some('-') => (-1.0, &s[1..]),
        Some('+') => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    let mut radix = radix as u32;
    let mut strip_prefix = true;
    if radix != 0 {
        if !(2..=36).contains(&radix) {
            return f64::NAN;
        }
        strip_prefix = radix == 16;
    } else {
        radix = 10;
    }
    let mut s = s;
    if strip_prefix && let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        s = rest;
        radix = 16;
    }
    let end = s
        .char_indices()
        .find(|(_, c)| c.to_digit(radix).is_none())
        .map_or(s.len(), |(i, _)| i);
    let digits = &s[..end];
    if digits.is_empty() {
        return f64::NAN;
    }
    if radix == 10 {
        return digits.parse::<f64>().map_or(f64::NAN, |n| sign * n);
    }
    let value = digits.chars().fold(0.0, |acc, c| {
        acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
    });
    sign * value
}

/// parseFloat: the longest prefix that is a `StrDecimalLiteral`.
fn parse_float(input: &str) -> f64 {
    let s = input.trim_start_matches(is_str_whitespace);
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    if s[i..].starts_with("Infinity") {
        return if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digit_count = i - digits_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let mut j = i + 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digit_count += j - i - 1;
        if digit_count > 0 {
            i = j;
        }
    }
    if digit_count == 0 {
        return f64::NAN;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    s[..i].parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_radix_handling() {
        assert_eq!(parse_int("  42px", 0), 42.0);
        assert_eq!(parse_int("0x1F", 0), 31.0);
        assert_eq!(parse_int("0x1F", 16), 31.0);
        assert_eq!(parse_int("0x1F", 10), 0.0);
        assert_eq!(parse_int("-101", 2), -5.0);
        assert_eq!(parse_int("z", 36), 35.0);
        assert!(parse_int("12", 1).is_nan());
        assert!(parse_int("", 0).is_nan());
        assert!(parse_int("-", 0).is_nan());
    }

    #[test]
    fn parse_float_prefixes() {
        assert_eq!(parse_float("3.25abc"), 3.25);
        assert_eq!(parse_float("  -.5"), -0.5);
        assert_eq!(parse_float("1e3x"), 1000.0);
        assert_eq!(parse_float("1e"), 1.0);
        assert_eq!(parse_float("5."), 5.0);
        assert_eq!(parse_float("-Infinityx"), f64::NEG_INFINITY);
        assert!(parse_float(".").is_nan());
        assert!(parse_float("abc").is_nan());
    }

    fn run(src: &str) -> String {
        let mut interp = Interpreter::new();
        let v = interp.evaluate(src).unwrap();
        interp.display_value(&v)
    }

    #[test]
    fn direct_eval_sees_caller_scope() {
        assert_eq!(run("(function () { var x = 1; eval('x = 2; var y = 3'); return x + y; })()"), "5");
        assert_eq!(run("var x = 'g'; (function () { var x = 'l'; return (0, eval)('x'); })()"), "g");
        assert_eq!(run("eval('1; 2')"), "2");
        assert_eq!(run("eval(5)"), "5");
    }

    #[test]
    fn strict_eval_keeps_its_vars() {
        assert_eq!(run("(function () { 'use strict'; eval('var z = 1'); return typeof z; })()"), "undefined");
        assert_eq!(run("eval('\"use strict\"; var w = 1'); typeof w"), "undefined");
    }

    #[test]
    fn eval_var_bindings_are_deletable() {
        assert_eq!(run("eval('var d = 1'); delete d"), "true");
        assert_eq!(run("var v = 1; delete v"), "false");
    }

    #[test]
    fn eval_syntax_errors_are_catchable() {
        assert_eq!(
            run("try { eval('var = 1'); } catch (e) { e instanceof SyntaxError }"),
            "true"
        );
    }

    #[test]
    fn global_constants_are_read_only() {
        assert_eq!(run("NaN = 1; typeof NaN === 'number' && NaN !== NaN"), "true");
        assert_eq!(run("isNaN('x') && isFinite('12') && !isFinite(Infinity)"), "true");
    }
}
