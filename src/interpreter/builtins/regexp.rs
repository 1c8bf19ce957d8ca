use super::*;
use std::fmt;

fn is_syntax_character(c: char) -> bool {
    matches!(
        c,
        '^' | '$' | '\\' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
    )
}

/// Appends `ch` so that it matches itself.
fn push_literal_char(result: &mut String, ch: char, in_char_class: bool) {
    if is_syntax_character(ch) || (in_char_class && matches!(ch, '-' | '&' | '~')) {
        result.push('\\');
    }
    result.push(ch);
}

fn hex_escape(chars: &[char], start: usize, digits: usize) -> Option<char> {
    let hex: String = chars.get(start..start + digits)?.iter().collect();
    if hex.len() != digits || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
}

/// Rewrites an ES5 pattern into the syntax shared by `fancy_regex` and `regex`.
fn translate_js_pattern(source: &str, flags: &RegExpFlags) -> String {
    let mut result = String::new();
    if flags.ignore_case {
        result.push_str("(?i)");
    }
    if flags.multiline {
        result.push_str("(?m)");
    }

    let chars: Vec<char> = source.chars().collect();
    let len = chars.len();
    let mut i = 0;
    let mut in_char_class = false;

    while i < len {
        let c = chars[i];

        if c == '[' && !in_char_class {
            if chars.get(i + 1) == Some(&']') {
                result.push_str(r"(?:\b\B)");
                i += 2;
                continue;
            }
            if chars.get(i + 1) == Some(&'^') && chars.get(i + 2) == Some(&']') {
                result.push_str(r"[\s\S]");
                i += 3;
                continue;
            }
            in_char_class = true;
            result.push(c);
            if chars.get(i + 1) == Some(&'^') {
                result.push('^');
                i += 1;
            }
            i += 1;
            continue;
        }
        if c == ']' && in_char_class {
            in_char_class = false;
            result.push(c);
            i += 1;
            continue;
        }
        if c == '[' && in_char_class {
            result.push_str(r"\[");
            i += 1;
            continue;
        }
        if c == '.' && !in_char_class {
            result.push_str("[^\\n\\r\u{2028}\u{2029}]");
            i += 1;
            continue;
        }

        if c == '\\' && i + 1 < len {
            let next = chars[i + 1];
            match next {
                '0' if i + 2 >= len || !chars[i + 2].is_ascii_digit() => {
                    result.push_str(r"\x00");
                    i += 2;
                }
                'c' if i + 2 < len && chars[i + 2].is_ascii_alphabetic() => {
                    let ctrl = char::from(chars[i + 2] as u8 % 32);
                    result.push_str(&format!(r"\x{:02x}", ctrl as u32));
                    i += 3;
                }
                'x' if hex_escape(&chars, i + 2, 2).is_some() => {
                    if let Some(ch) = hex_escape(&chars, i + 2, 2) {
                        push_literal_char(&mut result, ch, in_char_class);
                    }
                    i += 4;
                }
                'u' if hex_escape(&chars, i + 2, 4).is_some() => {
                    if let Some(ch) = hex_escape(&chars, i + 2, 4) {
                        push_literal_char(&mut result, ch, in_char_class);
                    }
                    i += 6;
                }
                'd' => {
                    result.push_str(if in_char_class { "0-9" } else { "[0-9]" });
                    i += 2;
                }
                'D' if !in_char_class => {
                    result.push_str("[^0-9]");
                    i += 2;
                }
                'w' => {
                    result.push_str(if in_char_class { "A-Za-z0-9_" } else { "[A-Za-z0-9_]" });
                    i += 2;
                }
                'W' if !in_char_class => {
                    result.push_str("[^A-Za-z0-9_]");
                    i += 2;
                }
                'b' if in_char_class => {
                    result.push_str(r"\x08");
                    i += 2;
                }
                'v' => {
                    result.push_str(r"\x0B");
                    i += 2;
                }
                'D' | 'W' | 's' | 'S' | 'b' | 'B' | 'n' | 'r' | 't' | 'f' => {
                    result.push('\\');
                    result.push(next);
                    i += 2;
                }
                '1'..='9' if !in_char_class => {
                    result.push('\\');
                    result.push(next);
                    i += 2;
                    while i < len && chars[i].is_ascii_digit() {
                        result.push(chars[i]);
                        i += 1;
                    }
                }
                _ => {
                    push_literal_char(&mut result, next, in_char_class);
                    i += 2;
                }
            }
            continue;
        }

        if in_char_class && matches!(c, '&' | '~') {
            push_literal_char(&mut result, c, true);
        } else {
            result.push(c);
        }
        i += 1;
    }

    result
}

enum CompiledRegex {
    Fancy(fancy_regex::Regex),
    Standard(regex::Regex),
}

fn build_regex(source: &str, flags: &RegExpFlags) -> Result<CompiledRegex, String> {
    let pattern = translate_js_pattern(source, flags);
    match fancy_regex::Regex::new(&pattern) {
        Ok(r) => Ok(CompiledRegex::Fancy(r)),
        Err(fancy_err) => regex::Regex::new(&pattern)
            .map(CompiledRegex::Standard)
            .map_err(|_| fancy_err.to_string()),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RegExpFlags {
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
}

impl RegExpFlags {
    fn parse(flags: &str) -> JsResult<Self> {
        let mut parsed = Self::default();
        for c in flags.chars() {
            let slot = match c {
                'g' => &mut parsed.global,
                'i' => &mut parsed.ignore_case,
                'm' => &mut parsed.multiline,
                _ => return Err(invalid_flags(flags)),
            };
            if *slot {
                return Err(invalid_flags(flags));
            }
            *slot = true;
        }
        Ok(parsed)
    }
}

fn invalid_flags(flags: &str) -> JsError {
    JsError::syntax_error(format!("Invalid flags supplied to RegExp constructor '{flags}'"))
}

impl fmt::Display for RegExpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (set, c) in [(self.global, 'g'), (self.ignore_case, 'i'), (self.multiline, 'm')] {
            if set {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

/// A successful match; offsets are UTF-16 code unit indices.
#[derive(Debug, Clone)]
pub(crate) struct RegExpMatch {
    pub start: usize,
    pub end: usize,
    /// Capture groups 1..n; `None` for a group that did not participate.
    pub captures: Vec<Option<(usize, usize)>>,
}

/// Compiled state behind a RegExp object.
pub struct RegExpData {
    pub source: String,
    pub(crate) flags: RegExpFlags,
    compiled: CompiledRegex,
}

impl fmt::Debug for RegExpData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegExpData({self})")
    }
}

impl fmt::Display for RegExpData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

fn utf16_to_byte(text: &str, index: usize) -> Option<usize> {
    let mut units = 0;
    for (byte, ch) in text.char_indices() {
        if units >= index {
            return Some(byte);
        }
        units += ch.len_utf16();
    }
    (units >= index).then_some(text.len())
}

fn byte_to_utf16(text: &str, byte: usize) -> usize {
    text[..byte].encode_utf16().count()
}

/// Escapes unescaped slashes so the source can sit between `/` delimiters.
fn escape_source(pattern: &str) -> String {
    if pattern.is_empty() {
        return "(?:)".to_string();
    }
    let mut out = String::with_capacity(pattern.len());
    let mut escaped = false;
    let mut in_class = false;
    for c in pattern.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '[' {
            in_class = true;
        } else if c == ']' {
            in_class = false;
        } else if c == '/' && !in_class {
            out.push('\\');
        } else if c == '\n' {
            out.push_str("\\n");
            continue;
        }
        out.push(c);
    }
    out
}

impl RegExpData {
    pub(crate) fn new(pattern: &str, flags: &str) -> JsResult<Self> {
        let flags = RegExpFlags::parse(flags)?;
        let compiled = build_regex(pattern, &flags).map_err(|e| {
            JsError::syntax_error(format!("Invalid regular expression: /{pattern}/: {e}"))
        })?;
        Ok(Self {
            source: escape_source(pattern),
            flags,
            compiled,
        })
    }

    /// Leftmost match starting at or after UTF-16 index `from`.
    pub(crate) fn find_from(&self, text: &str, from: usize) -> JsResult<Option<RegExpMatch>> {
        let Some(pos) = utf16_to_byte(text, from) else {
            return Ok(None);
        };
        let spans: Vec<Option<(usize, usize)>> = match &self.compiled {
            CompiledRegex::Fancy(r) => {
                let caps = r
                    .captures_from_pos(text, pos)
                    .map_err(|e| JsError::range_error(format!("Regular expression failed: {e}")))?;
                let Some(caps) = caps else {
                    return Ok(None);
                };
                (0..caps.len())
                    .map(|i| caps.get(i).map(|m| (m.start(), m.end())))
                    .collect()
            }
            CompiledRegex::Standard(r) => {
                let Some(caps) = r.captures_at(text, pos) else {
                    return Ok(None);
                };
                (0..caps.len())
                    .map(|i| caps.get(i).map(|m| (m.start(), m.end())))
                    .collect()
            }
        };
        let to_units = |(s, e): (usize, usize)| (byte_to_utf16(text, s), byte_to_utf16(text, e));
        let Some(Some(whole)) = spans.first().copied() else {
            return Ok(None);
        };
        let (start, end) = to_units(whole);
        Ok(Some(RegExpMatch {
            start,
            end,
            captures: spans[1..].iter().map(|span| span.map(to_units)).collect(),
        }))
    }
}

impl Interpreter {
    /// A new RegExp object; invalid patterns or flags raise SyntaxError.
    pub(crate) fn create_regexp(&mut self, pattern: &str, flags: &str) -> JsResult<JsObject> {
        let re = RegExpData::new(pattern, flags)?;
        let constants = [
            ("source", JsValue::from_str(&re.source)),
            ("global", JsValue::Boolean(re.flags.global)),
            ("ignoreCase", JsValue::Boolean(re.flags.ignore_case)),
            ("multiline", JsValue::Boolean(re.flags.multiline)),
        ];
        let mut obj = JsObjectData::with_kind(
            Some(self.realm.regexp_prototype),
            "RegExp",
            ObjectKind::RegExp(Rc::new(re)),
        );
        for (name, value) in constants {
            obj.insert_property(
                name.to_string(),
                PropertyDescriptor::data(value, false, false, false),
            );
        }
        obj.insert_property(
            "lastIndex".to_string(),
            PropertyDescriptor::data(JsValue::Number(0.0), true, false, false),
        );
        Ok(self.alloc(obj))
    }

    /// The compiled data of a RegExp object.
    pub(crate) fn regexp_data(&self, v: &JsValue) -> Option<Rc<RegExpData>> {
        let JsValue::Object(o) = v else {
            return None;
        };
        match &self.get_object(*o).borrow().kind {
            ObjectKind::RegExp(re) => Some(re.clone()),
            _ => None,
        }
    }

    fn this_regexp(&self, this: &JsValue, method: &str) -> JsResult<(JsObject, Rc<RegExpData>)> {
        match (this, self.regexp_data(this)) {
            (JsValue::Object(o), Some(re)) => Ok((*o, re)),
            _ => Err(JsError::type_error(format!(
                "RegExp.prototype.{method} called on incompatible receiver {}",
                self.describe_value(this)
            ))),
        }
    }

    /// The match array `exec` returns, with `index` and `input`.
    pub(crate) fn match_to_array(&mut self, input: &JsString, m: &RegExpMatch) -> JsObject {
        let mut elements = vec![JsValue::String(input.substring(m.start, m.end))];
        elements.extend(m.captures.iter().map(|span| match span {
            Some((s, e)) => JsValue::String(input.substring(*s, *e)),
            None => JsValue::Undefined,
        }));
        let array = self.create_array(elements);
        let data = self.get_object(array);
        let mut data = data.borrow_mut();
        data.insert_value("index".to_string(), JsValue::Number(m.start as f64));
        data.insert_value("input".to_string(), JsValue::String(input.clone()));
        array
    }

    /// RegExp.prototype.exec without building the result array (15.10.6.2).
    pub(crate) fn regexp_exec_raw(&mut self, r: JsObject, re: &RegExpData, input: &JsString) -> JsResult<Option<RegExpMatch>> {
        let last_index = self.get(r, "lastIndex")?;
        let mut i = self.to_integer(&last_index)?;
        if !re.flags.global {
            i = 0.0;
        }
        let found = if i < 0.0 || i > input.len() as f64 {
            None
        } else {
            re.find_from(&input.to_rust_string(), i as usize)?
        };
        match &found {
            None => self.put(r, "lastIndex", JsValue::Number(0.0), true)?,
            Some(m) if re.flags.global => self.put(r, "lastIndex", JsValue::Number(m.end as f64), true)?,
            Some(_) => {}
        }
        Ok(found)
    }

    fn construct_regexp(&mut self, args: &[JsValue], called_as_function: bool) -> JsResult<JsValue> {
        let pattern = arg(args, 0);
        let flags = arg(args, 1);
        if let Some(re) = self.regexp_data(&pattern) {
            if !flags.is_undefined() {
                return Err(JsError::type_error(
                    "Cannot supply flags when constructing one RegExp from another",
                ));
            }
            if called_as_function {
                return Ok(pattern);
            }
            let source = if re.source == "(?:)" { String::new() } else { re.source.clone() };
            return Ok(JsValue::Object(self.create_regexp(&source, &re.flags.to_string())?));
        }
        let pattern = if pattern.is_undefined() {
            String::new()
        } else {
            self.to_string(&pattern)?.to_rust_string()
        };
        let flags = if flags.is_undefined() {
            String::new()
        } else {
            self.to_string(&flags)?.to_rust_string()
        };
        Ok(JsValue::Object(self.create_regexp(&pattern, &flags)?))
    }

    pub(crate) fn setup_regexp(&mut self) {
        let proto = self.realm.regexp_prototype;
        self.native_constructor(
            "RegExp",
            2,
            Rc::new(|interp, _this, args| interp.construct_regexp(args, true)),
            Rc::new(|interp, args| interp.construct_regexp(args, false)),
            proto,
        );

        let methods: Methods = vec![
            (
                "exec",
                1,
                Rc::new(|interp, this, args| {
                    let (r, re) = interp.this_regexp(this, "exec")?;
                    let input = interp.to_string(&arg(args, 0))?;
                    match interp.regexp_exec_raw(r, &re, &input)? {
                        Some(m) => Ok(JsValue::Object(interp.match_to_array(&input, &m))),
                        None => Ok(JsValue::Null),
                    }
                }),
            ),
            (
                "test",
                1,
                Rc::new(|interp, this, args| {
                    let (r, re) = interp.this_regexp(this, "test")?;
                    let input = interp.to_string(&arg(args, 0))?;
                    Ok(JsValue::Boolean(interp.regexp_exec_raw(r, &re, &input)?.is_some()))
                }),
            ),
            (
                "toString",
                0,
                Rc::new(|interp, this, _args| {
                    let (_, re) = interp.this_regexp(this, "toString")?;
                    Ok(JsValue::from_str(&re.to_string()))
                }),
            ),
        ];
        self.define_methods(proto, methods);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> String {
        let mut interp = Interpreter::new();
        match interp.evaluate(src) {
            Ok(v) => {
                let s = interp.to_string(&v).unwrap();
                s.to_rust_string()
            }
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn translation() {
        let flags = RegExpFlags {
            ignore_case: true,
            ..Default::default()
        };
        assert_eq!(translate_js_pattern(r"a\d", &flags), "(?i)a[0-9]");
        assert_eq!(translate_js_pattern(r"[\w-]", &RegExpFlags::default()), "[A-Za-z0-9_-]");
        assert_eq!(translate_js_pattern(r"\/xA", &RegExpFlags::default()), "/xA");
        assert_eq!(translate_js_pattern("a[]", &RegExpFlags::default()), r"a(?:\b\B)");
        assert_eq!(translate_js_pattern("[^]", &RegExpFlags::default()), r"[\s\S]");
    }

    #[test]
    fn utf16_offsets() {
        let re = RegExpData::new("b", "").unwrap();
        let m = re.find_from("\u{1F600}b", 0).unwrap().unwrap();
        assert_eq!((m.start, m.end), (2, 3));
        assert!(re.find_from("ab", 2).unwrap().is_none());
    }

    #[test]
    fn invalid_patterns_and_flags() {
        assert!(RegExpData::new("(", "").is_err());
        assert!(RegExpData::new("a", "gg").is_err());
        assert!(RegExpData::new("a", "x").is_err());
        assert_eq!(
            run("try { new RegExp('['); } catch (e) { e.name }"),
            "SyntaxError"
        );
    }

    #[test]
    fn exec_results() {
        assert_eq!(run("var m = /(\\d+)-(x)?/.exec('ab12-c'); [m[0], m[1], m[2], m.index, m.input].join('|')"), "12-|12||2|ab12-c");
        assert_eq!(run("/z/.exec('abc')"), "null");
        assert_eq!(run("/A/i.test('a') && !/^b/.test('ab') && /^b/m.test('a\\nb')"), "true");
    }

    #[test]
    fn global_last_index() {
        assert_eq!(
            run("var r = /a/g; var s = 'aXa'; [r.test(s), r.lastIndex, r.test(s), r.lastIndex, r.test(s), r.lastIndex].join()"),
            "true,1,true,3,false,0"
        );
    }

    #[test]
    fn backreferences_and_properties() {
        assert_eq!(run("/(a)\\1/.test('aa')"), "true");
        assert_eq!(run("var r = /x\\/y/gi; [r.source, r.global, r.ignoreCase, r.multiline].join()"), "x\\/y,true,true,false");
        assert_eq!(run("String(new RegExp('a/b', 'm'))"), "/a\\/b/m");
        assert_eq!(run("String(new RegExp())"), "/(?:)/");
        assert_eq!(run("var r = /a/; RegExp(r) === r && new RegExp(r) !== r"), "true");
    }
}
