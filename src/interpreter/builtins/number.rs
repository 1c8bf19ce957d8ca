use super::*;

/// Exact decimal significand digits and exponent of a finite non-negative
/// number: `x = d0.d1d2... * 10^exp`.
fn decimal_digits(x: f64) -> (Vec<u8>, i32) {
    // A double expands to at most 767 significant decimal digits
    let s = format!("{x:.799e}");
    split_exponential(&s)
}

/// Shortest round-tripping digits, as `Number.prototype.toString` picks them.
fn shortest_digits(x: f64) -> (Vec<u8>, i32) {
    let s = format!("{x:e}");
    let (mut digits, exp) = split_exponential(&s);
    while digits.len() > 1 && digits.last() == Some(&0) {
        digits.pop();
    }
    (digits, exp)
}

fn split_exponential(s: &str) -> (Vec<u8>, i32) {
    let (mantissa, exp) = s.split_once('e').unwrap_or((s, "0"));
    let digits = mantissa.bytes().filter(u8::is_ascii_digit).map(|b| b - b'0').collect();
    (digits, exp.parse().unwrap_or(0))
}

/// Keeps `keep` significant digits, rounding half away from zero.
fn round_digits(digits: &[u8], exp: i32, keep: i32) -> (Vec<u8>, i32) {
    if keep < 0 {
        return (Vec::new(), exp);
    }
    let keep = keep as usize;
    let mut kept: Vec<u8> = digits.iter().copied().take(keep).collect();
    kept.resize(keep, 0);
    let mut exp = exp;
    if digits.get(keep).is_some_and(|&d| d >= 5) {
        let mut i = kept.len();
        loop {
            if i == 0 {
                kept.insert(0, 1);
                kept.truncate(keep.max(1));
                exp += 1;
                break;
            }
            i -= 1;
            if kept[i] == 9 {
                kept[i] = 0;
            } else {
                kept[i] += 1;
                break;
            }
        }
    }
    (kept, exp)
}

fn digit_char(d: u8) -> char {
    char::from(b'0' + d)
}

/// Positional rendering with exactly `fraction` digits after the point.
fn render_fixed(digits: &[u8], exp: i32, fraction: i32) -> String {
    let digit_at = |k: i32| {
        let idx = exp - k;
        usize::try_from(idx)
            .ok()
            .and_then(|i| digits.get(i))
            .map_or('0', |&d| digit_char(d))
    };
    let mut s: String = (0..=exp.max(0)).rev().map(digit_at).collect();
    if fraction > 0 {
        s.push('.');
        s.extend((1..=fraction).map(|k| digit_at(-k)));
    }
    s
}

fn render_exponential(digits: &[u8], exp: i32) -> String {
    let mut s = String::new();
    s.push(digits.first().map_or('0', |&d| digit_char(d)));
    if digits.len() > 1 {
        s.push('.');
        s.extend(digits[1..].iter().map(|&d| digit_char(d)));
    }
    let sign = if exp >= 0 { "+" } else { "-" };
    format!("{s}e{sign}{}", exp.abs())
}

fn with_sign(negative: bool, s: String) -> String {
    if negative { format!("-{s}") } else { s }
}

/// `Number.prototype.toFixed` for a finite value below 1e21.
pub(crate) fn format_fixed(x: f64, fraction: usize) -> String {
    let (digits, exp) = decimal_digits(x.abs());
    let fraction = fraction as i32;
    let (rounded, exp) = round_digits(&digits, exp, exp + 1 + fraction);
    with_sign(x < 0.0, render_fixed(&rounded, exp, fraction))
}

/// `Number.prototype.toExponential`; `None` uses as many digits as needed.
pub(crate) fn format_exponential(x: f64, fraction: Option<usize>) -> String {
    let (digits, exp) = match fraction {
        Some(f) => {
            let (digits, exp) = decimal_digits(x.abs());
            round_digits(&digits, exp, f as i32 + 1)
        }
        None => shortest_digits(x.abs()),
    };
    with_sign(x < 0.0, render_exponential(&digits, exp))
}

/// `Number.prototype.toPrecision` for a finite value.
pub(crate) fn format_precision(x: f64, precision: usize) -> String {
    let p = precision as i32;
    let (digits, exp) = decimal_digits(x.abs());
    let (rounded, exp) = round_digits(&digits, exp, p);
    let body = if x != 0.0 && (exp < -6 || exp >= p) {
        render_exponential(&rounded, exp)
    } else {
        render_fixed(&rounded, exp, p - 1 - exp)
    };
    with_sign(x < 0.0, body)
}

fn non_finite(x: f64) -> Option<JsValue> {
    (!x.is_finite()).then(|| JsValue::from_str(&number_ops::to_string(x)))
}

impl Interpreter {
    fn this_number_value(&self, this: &JsValue, method: &str) -> JsResult<f64> {
        match this {
            JsValue::Number(n) => Ok(*n),
            JsValue::Object(o) => match self.get_object(*o).borrow().kind {
                ObjectKind::Number(n) => Ok(n),
                _ => Err(JsError::type_error(format!("Number.prototype.{method} requires a Number"))),
            },
            _ => Err(JsError::type_error(format!("Number.prototype.{method} requires a Number"))),
        }
    }

    pub(crate) fn setup_number(&mut self) {
        let proto = self.realm.number_prototype;
        let ctor = self.native_constructor(
            "Number",
            1,
            Rc::new(|interp, _this, args| match args.first() {
                None => Ok(JsValue::Number(0.0)),
                Some(v) => Ok(JsValue::Number(interp.to_number(v)?)),
            }),
            Rc::new(|interp, args| {
                let n = match args.first() {
                    None => 0.0,
                    Some(v) => interp.to_number(v)?,
                };
                let data = JsObjectData::with_kind(Some(interp.realm.number_prototype), "Number", ObjectKind::Number(n));
                Ok(JsValue::Object(interp.alloc(data)))
            }),
            proto,
        );
        self.define_constants(
            ctor,
            &[
                ("MAX_VALUE", JsValue::Number(f64::MAX)),
                ("MIN_VALUE", JsValue::Number(f64::from_bits(1))),
                ("NaN", JsValue::Number(f64::NAN)),
                ("NEGATIVE_INFINITY", JsValue::Number(f64::NEG_INFINITY)),
                ("POSITIVE_INFINITY", JsValue::Number(f64::INFINITY)),
            ],
        );

        let methods: Methods = vec![
            (
                "toString",
                1,
                Rc::new(|interp, this, args| {
                    let n = interp.this_number_value(this, "toString")?;
                    let radix = match arg(args, 0) {
                        JsValue::Undefined => 10.0,
                        v => interp.to_integer(&v)?,
                    };
                    if !(2.0..=36.0).contains(&radix) {
                        return Err(JsError::range_error("toString() radix must be between 2 and 36"));
                    }
                    Ok(JsValue::from_str(&number_ops::to_string_radix(n, radix as u32)))
                }),
            ),
            (
                "toLocaleString",
                0,
                Rc::new(|interp, this, _args| {
                    let n = interp.this_number_value(this, "toLocaleString")?;
                    Ok(JsValue::from_str(&number_ops::to_string(n)))
                }),
            ),
            (
                "valueOf",
                0,
                Rc::new(|interp, this, _args| Ok(JsValue::Number(interp.this_number_value(this, "valueOf")?))),
            ),
            (
                "toFixed",
                1,
                Rc::new(|interp, this, args| {
                    let n = interp.this_number_value(this, "toFixed")?;
                    let f = interp.to_integer(&arg(args, 0))?;
                    if !(0.0..=20.0).contains(&f) {
                        return Err(JsError::range_error("toFixed() digits argument must be between 0 and 20"));
                    }
                    if let Some(v) = non_finite(n) {
                        return Ok(v);
                    }
                    if n.abs() >= 1e21 {
                        return Ok(JsValue::from_str(&number_ops::to_string(n)));
                    }
                    Ok(JsValue::from_str(&format_fixed(n, f as usize)))
                }),
            ),
            (
                "toExponential",
                1,
                Rc::new(|interp, this, args| {
                    let n = interp.this_number_value(this, "toExponential")?;
                    let fraction = arg(args, 0);
                    let f = interp.to_integer(&fraction)?;
                    if let Some(v) = non_finite(n) {
                        return Ok(v);
                    }
                    if !(0.0..=20.0).contains(&f) {
                        return Err(JsError::range_error("toExponential() argument must be between 0 and 20"));
                    }
                    let digits = (!fraction.is_undefined()).then_some(f as usize);
                    Ok(JsValue::from_str(&format_exponential(n, digits)))
                }),
            ),
            (
                "toPrecision",
                1,
                Rc::new(|interp, this, args| {
                    let n = interp.this_number_value(this, "toPrecision")?;
                    let precision = arg(args, 0);
                    if precision.is_undefined() {
                        return Ok(JsValue::from_str(&number_ops::to_string(n)));
                    }
                    let p = interp.to_integer(&precision)?;
                    if let Some(v) = non_finite(n) {
                        return Ok(v);
                    }
                    if !(1.0..=21.0).contains(&p) {
                        return Err(JsError::range_error("toPrecision() argument must be between 1 and 21"));
                    }
                    Ok(JsValue::from_str(&format_precision(n, p as usize)))
                }),
            ),
        ];
        self.define_methods(proto, methods);
    }
}
