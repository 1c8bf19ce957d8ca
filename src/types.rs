//! Language values shared by the interpreter and the builtins.

use std::fmt;

#[derive(Clone, Debug)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Object(JsObject),
}

/// A string as the language sees it: a sequence of UTF-16 code units, which
/// need not be well formed.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JsString {
    pub code_units: Vec<u16>,
}

impl JsString {
    pub fn from_str(s: &str) -> Self {
        JsString { code_units: s.encode_utf16().collect() }
    }

    pub fn from_units(code_units: Vec<u16>) -> Self {
        JsString { code_units }
    }

    pub fn is_empty(&self) -> bool {
        self.code_units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.code_units.len()
    }

    /// Lone surrogates become U+FFFD.
    pub fn to_rust_string(&self) -> String {
        String::from_utf16_lossy(&self.code_units)
    }

    pub fn concat(&self, other: &JsString) -> JsString {
        JsString { code_units: [self.code_units.as_slice(), &other.code_units].concat() }
    }

    /// Code units `start..end`, clamped to the string; empty when `start >= end`.
    pub fn substring(&self, start: usize, end: usize) -> JsString {
        let end = end.min(self.len());
        let units = self.code_units.get(start..end).unwrap_or_default();
        JsString { code_units: units.to_vec() }
    }

    /// First occurrence of `search` at or after `from`.
    pub fn index_of(&self, search: &JsString, from: usize) -> Option<usize> {
        let haystack = self.code_units.get(from..)?;
        if search.is_empty() {
            return Some(from);
        }
        haystack
            .windows(search.len())
            .position(|w| w == search.code_units.as_slice())
            .map(|i| i + from)
    }

    /// Last occurrence of `search` starting at or before `from`.
    pub fn last_index_of(&self, search: &JsString, from: usize) -> Option<usize> {
        let latest = self.len().checked_sub(search.len())?.min(from);
        if search.is_empty() {
            return Some(latest);
        }
        self.code_units[..latest + search.len()]
            .windows(search.len())
            .rposition(|w| w == search.code_units.as_slice())
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rust_string())
    }
}

/// Handle to an object slot in the interpreter heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JsObject {
    pub id: u64,
}

impl JsValue {
    pub fn from_str(s: &str) -> Self {
        JsValue::String(JsString::from_str(s))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JsValue::String(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn as_object(&self) -> Option<JsObject> {
        match self {
            JsValue::Object(o) => Some(*o),
            _ => None,
        }
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => f.write_str("undefined"),
            JsValue::Null => f.write_str("null"),
            JsValue::Boolean(b) => write!(f, "{b}"),
            JsValue::Number(n) => f.write_str(&number_ops::to_string(*n)),
            JsValue::String(s) => write!(f, "{s}"),
            JsValue::Object(_) => f.write_str("[object Object]"),
        }
    }
}

/// Number conversions of the language: string forms and the integer
/// conversions used by bitwise operators and array indices.
pub mod number_ops {
    const TWO_POW_32: f64 = 4294967296.0;
    const TWO_POW_16: f64 = 65536.0;

    /// Like `==` except that NaN equals itself and the zeros differ.
    pub fn same_value(x: f64, y: f64) -> bool {
        if x.is_nan() || y.is_nan() {
            return x.is_nan() && y.is_nan();
        }
        x == y && x.is_sign_negative() == y.is_sign_negative()
    }

    pub fn to_string(x: f64) -> String {
        if x.is_nan() {
            "NaN".to_string()
        } else if x == 0.0 {
            "0".to_string()
        } else if x.is_infinite() {
            if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
        } else {
            ryu_js::Buffer::new().format(x).to_string()
        }
    }

    /// `Number.prototype.toString(radix)` for radixes other than 10. The
    /// fraction stops once it is exhausted or after 52 digits.
    pub fn to_string_radix(x: f64, radix: u32) -> String {
        if radix == 10 || !x.is_finite() || x == 0.0 {
            return to_string(x);
        }
        let base = f64::from(radix);
        let digit = |d: f64| std::char::from_digit(d as u32, radix).unwrap_or('0');

        let mut whole = x.abs().trunc();
        let mut fraction = x.abs() - whole;
        let mut reversed = Vec::new();
        loop {
            reversed.push(digit(whole % base));
            whole = (whole / base).trunc();
            if whole < 1.0 {
                break;
            }
        }
        if x < 0.0 {
            reversed.push('-');
        }
        let mut out: String = reversed.into_iter().rev().collect();
        if fraction > 0.0 {
            out.push('.');
            for _ in 0..52 {
                fraction *= base;
                out.push(digit(fraction.trunc()));
                fraction = fraction.fract();
                if fraction == 0.0 {
                    break;
                }
            }
        }
        out
    }

    pub fn to_uint32(x: f64) -> u32 {
        if !x.is_finite() {
            return 0;
        }
        x.trunc().rem_euclid(TWO_POW_32) as u32
    }

    pub fn to_int32(x: f64) -> i32 {
        to_uint32(x) as i32
    }

    pub fn to_uint16(x: f64) -> u16 {
        if !x.is_finite() {
            return 0;
        }
        x.trunc().rem_euclid(TWO_POW_16) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn js(s: &str) -> JsString {
        JsString::from_str(s)
    }

    #[test]
    fn searching_by_code_unit() {
        let s = js("abcabc");
        assert_eq!(s.index_of(&js("bc"), 0), Some(1));
        assert_eq!(s.index_of(&js("bc"), 2), Some(4));
        assert_eq!(s.index_of(&js("x"), 0), None);
        assert_eq!(s.index_of(&js(""), 6), Some(6));
        assert_eq!(s.index_of(&js(""), 7), None);
        assert_eq!(s.last_index_of(&js("abc"), 5), Some(3));
        assert_eq!(s.last_index_of(&js("abc"), 2), Some(0));
        assert_eq!(s.last_index_of(&js(""), 99), Some(6));
        assert_eq!(js("ab").last_index_of(&js("abc"), 0), None);
    }

    #[test]
    fn substring_clamps() {
        let s = js("hello");
        assert_eq!(s.substring(1, 3), js("el"));
        assert_eq!(s.substring(3, 99), js("lo"));
        assert_eq!(s.substring(4, 2), js(""));
        assert_eq!(s.substring(9, 12), js(""));
        assert_eq!(s.concat(&js("!")), js("hello!"));
    }

    #[test]
    fn strings_order_by_code_unit() {
        assert!(js("B") < js("a"));
        assert!(js("ab") < js("abc"));
        // a surrogate pair sorts before U+FF61 even though its code point is higher
        assert!(js("\u{1f600}") < js("\u{ff61}"));
    }

    #[test]
    fn number_to_string() {
        assert_eq!(number_ops::to_string(f64::NAN), "NaN");
        assert_eq!(number_ops::to_string(-0.0), "0");
        assert_eq!(number_ops::to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_ops::to_string(1e21), "1e+21");
        assert_eq!(number_ops::to_string(0.1), "0.1");
        assert_eq!(number_ops::to_string(123.0), "123");
    }

    #[test]
    fn same_value_distinguishes_zeros() {
        assert!(number_ops::same_value(f64::NAN, f64::NAN));
        assert!(!number_ops::same_value(0.0, -0.0));
        assert!(!number_ops::same_value(1.0, f64::NAN));
        assert!(number_ops::same_value(-0.0, -0.0));
    }

    #[test]
    fn integer_conversions_wrap() {
        assert_eq!(number_ops::to_int32(f64::NAN), 0);
        assert_eq!(number_ops::to_int32(f64::INFINITY), 0);
        assert_eq!(number_ops::to_int32(-42.9), -42);
        assert_eq!(number_ops::to_int32(2147483648.0), i32::MIN);
        assert_eq!(number_ops::to_int32(4294967301.0), 5);
        assert_eq!(number_ops::to_uint32(-1.0), u32::MAX);
        assert_eq!(number_ops::to_uint32(1e20), 1661992960);
        assert_eq!(number_ops::to_uint16(65537.0), 1);
        assert_eq!(number_ops::to_uint16(-1.0), 65535);
    }

    #[test]
    fn radix_strings() {
        assert_eq!(number_ops::to_string_radix(255.0, 16), "ff");
        assert_eq!(number_ops::to_string_radix(-8.0, 2), "-1000");
        assert_eq!(number_ops::to_string_radix(0.5, 2), "0.1");
        assert_eq!(number_ops::to_string_radix(0.25, 2), "0.01");
        assert_eq!(number_ops::to_string_radix(35.0, 36), "z");
    }

    #[test]
    fn display_matches_to_string() {
        assert_eq!(JsValue::Undefined.to_string(), "undefined");
        assert_eq!(JsValue::Number(42.0).to_string(), "42");
        assert_eq!(JsValue::from_str("hi").to_string(), "hi");
    }
}
