use super::*;

/// Preferred type passed to `[[DefaultValue]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Number,
    String,
}

pub(crate) fn to_boolean(v: &JsValue) -> bool {
    match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => !(n.is_nan() || *n == 0.0),
        JsValue::String(s) => !s.is_empty(),
        JsValue::Object(_) => true,
    }
}

/// `StrWhiteSpaceChar`: WhiteSpace or LineTerminator.
pub(crate) fn is_str_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'
            | '\u{000A}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{FEFF}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

/// ToNumber applied to a String (9.3.1).
pub(crate) fn string_to_number(s: &JsString) -> f64 {
    let text = s.to_rust_string();
    let trimmed = text.trim_matches(is_str_whitespace);
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return f64::NAN;
        }
        return hex
            .chars()
            .fold(0.0, |acc, c| acc * 16.0 + f64::from(c.to_digit(16).unwrap_or(0)));
    }
    let (sign, unsigned) = match trimmed.as_bytes()[0] {
        b'+' => (1.0, &trimmed[1..]),
        b'-' => (-1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }
    if !is_decimal_literal(unsigned) {
        return f64::NAN;
    }
    unsigned.parse::<f64>().map(|n| sign * n).unwrap_or(f64::NAN)
}

/// `StrUnsignedDecimalLiteral`; rejects the extra spellings Rust's parser accepts.
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

/// ToString of a primitive value.
pub(crate) fn primitive_to_string(v: &JsValue) -> JsString {
    match v {
        JsValue::Undefined => JsString::from_str("undefined"),
        JsValue::Null => JsString::from_str("null"),
        JsValue::Boolean(b) => JsString::from_str(if *b { "true" } else { "false" }),
        JsValue::Number(n) => JsString::from_str(&number_ops::to_string(*n)),
        JsValue::String(s) => s.clone(),
        JsValue::Object(_) => JsString::from_str("[object Object]"),
    }
}

pub(crate) fn same_value(x: &JsValue, y: &JsValue) -> bool {
    match (x, y) {
        (JsValue::Number(a), JsValue::Number(b)) => number_ops::same_value(*a, *b),
        _ => strict_equals(x, y),
    }
}

pub(crate) fn strict_equals(x: &JsValue, y: &JsValue) -> bool {
    match (x, y) {
        (JsValue::Undefined, JsValue::Undefined) | (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
        (JsValue::Number(a), JsValue::Number(b)) => a == b,
        (JsValue::String(a), JsValue::String(b)) => a == b,
        (JsValue::Object(a), JsValue::Object(b)) => a == b,
        _ => false,
    }
}

impl Interpreter {
    pub(crate) fn to_primitive(&mut self, v: &JsValue, hint: Option<Hint>) -> JsResult<JsValue> {
        match v {
            JsValue::Object(o) => self.default_value(*o, hint),
            other => Ok(other.clone()),
        }
    }

    pub(crate) fn to_number(&mut self, v: &JsValue) -> JsResult<f64> {
        Ok(match v {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(b) => f64::from(u8::from(*b)),
            JsValue::Number(n) => *n,
            JsValue::String(s) => string_to_number(s),
            JsValue::Object(_) => {
                let primitive = self.to_primitive(v, Some(Hint::Number))?;
                return self.to_number(&primitive);
            }
        })
    }

    pub(crate) fn to_integer(&mut self, v: &JsValue) -> JsResult<f64> {
        let n = self.to_number(v)?;
        Ok(if n.is_nan() {
            0.0
        } else if n.is_infinite() || n == 0.0 {
            n
        } else {
            n.trunc()
        })
    }

    pub(crate) fn to_int32(&mut self, v: &JsValue) -> JsResult<i32> {
        Ok(number_ops::to_int32(self.to_number(v)?))
    }

    pub(crate) fn to_uint32(&mut self, v: &JsValue) -> JsResult<u32> {
        Ok(number_ops::to_uint32(self.to_number(v)?))
    }

    pub(crate) fn to_uint16(&mut self, v: &JsValue) -> JsResult<u16> {
        Ok(number_ops::to_uint16(self.to_number(v)?))
    }

    pub(crate) fn to_string(&mut self, v: &JsValue) -> JsResult<JsString> {
        match v {
            JsValue::Object(_) => {
                let primitive = self.to_primitive(v, Some(Hint::String))?;
                Ok(primitive_to_string(&primitive))
            }
            other => Ok(primitive_to_string(other)),
        }
    }

    /// ToString as a Rust string, for use as a property name.
    pub(crate) fn to_property_key(&mut self, v: &JsValue) -> JsResult<String> {
        match v {
            JsValue::String(s) => Ok(s.to_rust_string()),
            JsValue::Number(n) => Ok(number_ops::to_string(*n)),
            other => Ok(self.to_string(other)?.to_rust_string()),
        }
    }

    pub(crate) fn to_object(&mut self, v: &JsValue) -> JsResult<JsObject> {
        let data = match v {
            JsValue::Object(o) => return Ok(*o),
            JsValue::Undefined | JsValue::Null => {
                return Err(JsError::type_error(format!(
                    "Cannot convert {v} to object"
                )));
            }
            JsValue::Boolean(b) => JsObjectData::with_kind(
                Some(self.realm.boolean_prototype),
                "Boolean",
                ObjectKind::Boolean(*b),
            ),
            JsValue::Number(n) => JsObjectData::with_kind(
                Some(self.realm.number_prototype),
                "Number",
                ObjectKind::Number(*n),
            ),
            JsValue::String(s) => return Ok(self.create_string_wrapper(s.clone())),
        };
        Ok(self.alloc(data))
    }

    pub(crate) fn create_string_wrapper(&mut self, s: JsString) -> JsObject {
        let length = s.len() as f64;
        let mut data = JsObjectData::with_kind(
            Some(self.realm.string_prototype),
            "String",
            ObjectKind::StringWrapper(s),
        );
        data.insert_property(
            "length".to_string(),
            PropertyDescriptor::data(JsValue::Number(length), false, false, false),
        );
        self.alloc(data)
    }

    pub(crate) fn abstract_equals(&mut self, x: &JsValue, y: &JsValue) -> JsResult<bool> {
        use JsValue::*;
        Ok(match (x, y) {
            (Undefined | Null, Undefined | Null) => true,
            (Number(a), String(b)) => *a == string_to_number(b),
            (String(a), Number(b)) => string_to_number(a) == *b,
            (Boolean(b), _) => return self.abstract_equals(&Number(f64::from(u8::from(*b))), y),
            (_, Boolean(b)) => return self.abstract_equals(x, &Number(f64::from(u8::from(*b)))),
            (Number(_) | String(_), Object(_)) => {
                let py = self.to_primitive(y, None)?;
                return self.abstract_equals(x, &py);
            }
            (Object(_), Number(_) | String(_)) => {
                let px = self.to_primitive(x, None)?;
                return self.abstract_equals(&px, y);
            }
            _ => strict_equals(x, y),
        })
    }

    /// The abstract relational comparison `x < y`; `None` when either side is NaN.
    /// `left_first` fixes the order in which the operands are converted.
    pub(crate) fn abstract_relational_comparison(
        &mut self,
        x: &JsValue,
        y: &JsValue,
        left_first: bool,
    ) -> JsResult<Option<bool>> {
        let (px, py) = if left_first {
            let px = self.to_primitive(x, Some(Hint::Number))?;
            let py = self.to_primitive(y, Some(Hint::Number))?;
            (px, py)
        } else {
            let py = self.to_primitive(y, Some(Hint::Number))?;
            let px = self.to_primitive(x, Some(Hint::Number))?;
            (px, py)
        };
        if let (JsValue::String(a), JsValue::String(b)) = (&px, &py) {
            return Ok(Some(a < b));
        }
        let nx = self.to_number(&px)?;
        let ny = self.to_number(&py)?;
        if nx.is_nan() || ny.is_nan() {
            return Ok(None);
        }
        Ok(Some(nx < ny))
    }

    pub(crate) fn type_of(&self, v: &JsValue) -> &'static str {
        match v {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Object(o) => {
                if self.get_object(*o).borrow().callable().is_some() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }
}
