use super::regexp::{RegExpData, RegExpMatch};
use super::*;

fn is_ecma_whitespace_unit(unit: u16) -> bool {
    char::from_u32(u32::from(unit)).is_some_and(is_str_whitespace)
}

/// Case mapping over code units; unpaired surrogates pass through unchanged.
fn map_case(s: &JsString, upper: bool) -> JsString {
    let mut out = Vec::with_capacity(s.len());
    let mut buf = [0u16; 2];
    for decoded in char::decode_utf16(s.code_units.iter().copied()) {
        match decoded {
            Ok(c) if upper => {
                for mapped in c.to_uppercase() {
                    out.extend_from_slice(mapped.encode_utf16(&mut buf));
                }
            }
            Ok(c) => {
                for mapped in c.to_lowercase() {
                    out.extend_from_slice(mapped.encode_utf16(&mut buf));
                }
            }
            Err(e) => out.push(e.unpaired_surrogate()),
        }
    }
    JsString::from_units(out)
}

fn clamp_index(pos: f64, len: usize) -> usize {
    pos.max(0.0).min(len as f64) as usize
}

/// Expands `$$`, `$&`, `` $` ``, `$'`, `$n` and `$nn` in a replacement template.
fn expand_template(template: &JsString, subject: &JsString, m: &RegExpMatch) -> Vec<u16> {
    let t = &template.code_units;
    let capture = |n: usize| -> Option<Vec<u16>> {
        let span = m.captures.get(n.checked_sub(1)?)?;
        Some(span.map_or_else(Vec::new, |(s, e)| subject.code_units[s..e].to_vec()))
    };
    let digit = |i: usize| -> Option<usize> {
        t.get(i)
            .and_then(|&u| char::from_u32(u32::from(u)))
            .and_then(|c| c.to_digit(10))
            .map(|d| d as usize)
    };
    let mut out = Vec::with_capacity(t.len());
    let mut i = 0;
    while i < t.len() {
        if t[i] != u16::from(b'$') || i + 1 >= t.len() {
            out.push(t[i]);
            i += 1;
            continue;
        }
        let next = t[i + 1];
        if next == u16::from(b'$') {
            out.push(next);
            i += 2;
        } else if next == u16::from(b'&') {
            out.extend_from_slice(&subject.code_units[m.start..m.end]);
            i += 2;
        } else if next == u16::from(b'`') {
            out.extend_from_slice(&subject.code_units[..m.start]);
            i += 2;
        } else if next == u16::from(b'\'') {
            out.extend_from_slice(&subject.code_units[m.end..]);
            i += 2;
        } else if let Some(d1) = digit(i + 1) {
            let two = digit(i + 2).map(|d2| d1 * 10 + d2);
            if let Some(text) = two.and_then(|nn| capture(nn)) {
                out.extend(text);
                i += 3;
            } else if let Some(text) = capture(d1) {
                out.extend(text);
                i += 2;
            } else {
                out.push(t[i]);
                i += 1;
            }
        } else {
            out.push(t[i]);
            i += 1;
        }
    }
    out
}

impl Interpreter {
    /// CheckObjectCoercible(this) followed by ToString.
    fn this_str(&mut self, this: &JsValue, method: &str) -> JsResult<JsString> {
        if this.is_nullish() {
            return Err(JsError::type_error(format!(
                "String.prototype.{method} called on null or undefined"
            )));
        }
        self.to_string(this)
    }

    fn this_string_value(&self, this: &JsValue, method: &str) -> JsResult<JsString> {
        match this {
            JsValue::String(s) => Ok(s.clone()),
            JsValue::Object(o) => match &self.get_object(*o).borrow().kind {
                ObjectKind::StringWrapper(s) => Ok(s.clone()),
                _ => Err(JsError::type_error(format!("String.prototype.{method} requires a String"))),
            },
            _ => Err(JsError::type_error(format!("String.prototype.{method} requires a String"))),
        }
    }

    /// The argument as a RegExp, compiling a fresh one for non-RegExp values.
    fn to_regexp(&mut self, v: &JsValue) -> JsResult<(JsObject, Rc<RegExpData>)> {
        if let (JsValue::Object(o), Some(re)) = (v, self.regexp_data(v)) {
            return Ok((*o, re));
        }
        let pattern = if v.is_undefined() {
            String::new()
        } else {
            self.to_string(v)?.to_rust_string()
        };
        let o = self.create_regexp(&pattern, "")?;
        let re = self
            .regexp_data(&JsValue::Object(o))
            .ok_or_else(|| JsError::type_error("RegExp expected"))?;
        Ok((o, re))
    }

    /// Every match of a global RegExp from index 0, advancing past empty matches.
    fn global_matches(&mut self, r: JsObject, re: &RegExpData, s: &JsString) -> JsResult<Vec<RegExpMatch>> {
        self.put(r, "lastIndex", JsValue::Number(0.0), true)?;
        let mut matches = Vec::new();
        while let Some(m) = self.regexp_exec_raw(r, re, s)? {
            if m.start == m.end {
                self.put(r, "lastIndex", JsValue::Number((m.end + 1) as f64), true)?;
            }
            matches.push(m);
        }
        Ok(matches)
    }

    fn string_replace(&mut self, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let s = self.this_str(this, "replace")?;
        let search = arg(args, 0);
        let matches = if let Some(re) = self.regexp_data(&search) {
            let JsValue::Object(r) = search else {
                return Err(JsError::type_error("RegExp expected"));
            };
            if re.flags.global {
                self.global_matches(r, &re, &s)?
            } else {
                self.regexp_exec_raw(r, &re, &s)?.into_iter().collect()
            }
        } else {
            let needle = self.to_string(&search)?;
            s.index_of(&needle, 0)
                .map(|start| RegExpMatch {
                    start,
                    end: start + needle.len(),
                    captures: Vec::new(),
                })
                .into_iter()
                .collect()
        };
        let replace_value = arg(args, 1);
        let template = if self.is_callable(&replace_value) {
            None
        } else {
            Some(self.to_string(&replace_value)?)
        };
        let mut out = Vec::with_capacity(s.len());
        let mut last = 0;
        for m in &matches {
            out.extend_from_slice(&s.code_units[last..m.start]);
            match &template {
                Some(t) => out.extend(expand_template(t, &s, m)),
                None => {
                    let mut call_args = vec![JsValue::String(s.substring(m.start, m.end))];
                    call_args.extend(m.captures.iter().map(|span| match span {
                        Some((a, b)) => JsValue::String(s.substring(*a, *b)),
                        None => JsValue::Undefined,
                    }));
                    call_args.push(JsValue::Number(m.start as f64));
                    call_args.push(JsValue::String(s.clone()));
                    let replaced = self.call(&replace_value, JsValue::Undefined, &call_args)?;
                    out.extend_from_slice(&self.to_string(&replaced)?.code_units);
                }
            }
            last = m.end;
        }
        out.extend_from_slice(&s.code_units[last..]);
        Ok(JsValue::String(JsString::from_units(out)))
    }

    fn string_split(&mut self, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let s = self.this_str(this, "split")?;
        let separator = arg(args, 0);
        let limit = match arg(args, 1) {
            JsValue::Undefined => u32::MAX,
            v => self.to_uint32(&v)?,
        } as usize;
        let regexp = self.regexp_data(&separator);
        let needle = match (&regexp, &separator) {
            (Some(_), _) | (None, JsValue::Undefined) => None,
            (None, v) => Some(self.to_string(v)?),
        };
        if limit == 0 {
            return Ok(JsValue::Object(self.create_array(Vec::new())));
        }
        if regexp.is_none() && needle.is_none() {
            return Ok(JsValue::Object(self.create_array(vec![JsValue::String(s)])));
        }
        let text = s.to_rust_string();
        let find = |q: usize| -> JsResult<Option<RegExpMatch>> {
            match (&regexp, &needle) {
                (Some(re), _) => re.find_from(&text, q),
                (None, Some(needle)) => Ok(s.index_of(needle, q).map(|start| RegExpMatch {
                    start,
                    end: start + needle.len(),
                    captures: Vec::new(),
                })),
                (None, None) => Ok(None),
            }
        };
        let size = s.len();
        if size == 0 {
            let parts = if find(0)?.is_some() {
                Vec::new()
            } else {
                vec![JsValue::String(s.clone())]
            };
            return Ok(JsValue::Object(self.create_array(parts)));
        }
        let mut parts = Vec::new();
        let (mut p, mut q) = (0, 0);
        while q < size {
            let Some(m) = find(q)? else {
                break;
            };
            if m.start >= size {
                break;
            }
            if m.end == p {
                q += 1;
                continue;
            }
            parts.push(JsValue::String(s.substring(p, m.start)));
            if parts.len() == limit {
                return Ok(JsValue::Object(self.create_array(parts)));
            }
            p = m.end;
            for span in &m.captures {
                parts.push(match span {
                    Some((a, b)) => JsValue::String(s.substring(*a, *b)),
                    None => JsValue::Undefined,
                });
                if parts.len() == limit {
                    return Ok(JsValue::Object(self.create_array(parts)));
                }
            }
            q = p;
        }
        parts.push(JsValue::String(s.substring(p, size)));
        Ok(JsValue::Object(self.create_array(parts)))
    }

    pub(crate) fn setup_string(&mut self) {
        let proto = self.realm.string_prototype;
        let ctor = self.native_constructor(
            "String",
            1,
            Rc::new(|interp, _this, args| match args.first() {
                None => Ok(JsValue::from_str("")),
                Some(v) => Ok(JsValue::String(interp.to_string(v)?)),
            }),
            Rc::new(|interp, args| {
                let s = match args.first() {
                    None => JsString::default(),
                    Some(v) => interp.to_string(v)?,
                };
                Ok(JsValue::Object(interp.create_string_wrapper(s)))
            }),
            proto,
        );
        let statics: Methods = vec![(
            "fromCharCode",
            1,
            Rc::new(|interp, _this, args| {
                let mut units = Vec::with_capacity(args.len());
                for a in args {
                    units.push(interp.to_uint16(a)?);
                }
                Ok(JsValue::String(JsString::from_units(units)))
            }),
        )];
        self.define_methods(ctor, statics);

        let methods: Methods = vec![
            (
                "toString",
                0,
                Rc::new(|interp, this, _args| Ok(JsValue::String(interp.this_string_value(this, "toString")?))),
            ),
            (
                "valueOf",
                0,
                Rc::new(|interp, this, _args| Ok(JsValue::String(interp.this_string_value(this, "valueOf")?))),
            ),
            (
                "charAt",
                1,
                Rc::new(|interp, this, args| {
                    let s = interp.this_str(this, "charAt")?;
                    let pos = interp.to_integer(&arg(args, 0))?;
                    if pos < 0.0 || pos >= s.len() as f64 {
                        return Ok(JsValue::from_str(""));
                    }
                    Ok(JsValue::String(s.substring(pos as usize, pos as usize + 1)))
                }),
            ),
            (
                "charCodeAt",
                1,
                Rc::new(|interp, this, args| {
                    let s = interp.this_str(this, "charCodeAt")?;
                    let pos = interp.to_integer(&arg(args, 0))?;
                    if pos < 0.0 || pos >= s.len() as f64 {
                        return Ok(JsValue::Number(f64::NAN));
                    }
                    Ok(JsValue::Number(f64::from(s.code_units[pos as usize])))
                }),
            ),
            (
                "concat",
                1,
                Rc::new(|interp, this, args| {
                    let mut s = interp.this_str(this, "concat")?;
                    for a in args {
                        s = s.concat(&interp.to_string(a)?);
                    }
                    Ok(JsValue::String(s))
                }),
            ),
            (
                "indexOf",
                1,
                Rc::new(|interp, this, args| {
                    let s = interp.this_str(this, "indexOf")?;
                    let search = interp.to_string(&arg(args, 0))?;
                    let pos = clamp_index(interp.to_integer(&arg(args, 1))?, s.len());
                    Ok(JsValue::Number(s.index_of(&search, pos).map_or(-1.0, |i| i as f64)))
                }),
            ),
            (
                "lastIndexOf",
                1,
                Rc::new(|interp, this, args| {
                    let s = interp.this_str(this, "lastIndexOf")?;
                    let search = interp.to_string(&arg(args, 0))?;
                    let n = interp.to_number(&arg(args, 1))?;
                    let pos = if n.is_nan() { f64::INFINITY } else { interp.to_integer(&JsValue::Number(n))? };
                    let start = clamp_index(pos, s.len());
                    Ok(JsValue::Number(s.last_index_of(&search, start).map_or(-1.0, |i| i as f64)))
                }),
            ),
            (
                "localeCompare",
                1,
                Rc::new(|interp, this, args| {
                    let s = interp.this_str(this, "localeCompare")?;
                    let that = interp.to_string(&arg(args, 0))?;
                    let order = match s.cmp(&that) {
                        std::cmp::Ordering::Less => -1.0,
                        std::cmp::Ordering::Equal => 0.0,
                        std::cmp::Ordering::Greater => 1.0,
                    };
                    Ok(JsValue::Number(order))
                }),
            ),
            (
                "match",
                1,
                Rc::new(|interp, this, args| {
                    let s = interp.this_str(this, "match")?;
                    let (r, re) = interp.to_regexp(&arg(args, 0))?;
                    if !re.flags.global {
                        return Ok(match interp.regexp_exec_raw(r, &re, &s)? {
                            Some(m) => JsValue::Object(interp.match_to_array(&s, &m)),
                            None => JsValue::Null,
                        });
                    }
                    let matches = interp.global_matches(r, &re, &s)?;
                    if matches.is_empty() {
                        return Ok(JsValue::Null);
                    }
                    let found = matches
                        .iter()
                        .map(|m| JsValue::String(s.substring(m.start, m.end)))
                        .collect();
                    Ok(JsValue::Object(interp.create_array(found)))
                }),
            ),
            ("replace", 2, Rc::new(|interp, this, args| interp.string_replace(this, args))),
            (
                "search",
                1,
                Rc::new(|interp, this, args| {
                    let s = interp.this_str(this, "search")?;
                    let (_, re) = interp.to_regexp(&arg(args, 0))?;
                    let found = re.find_from(&s.to_rust_string(), 0)?;
                    Ok(JsValue::Number(found.map_or(-1.0, |m| m.start as f64)))
                }),
            ),
            (
                "slice",
                2,
                Rc::new(|interp, this, args| {
                    let s = interp.this_str(this, "slice")?;
                    let len = s.len() as f64;
                    let relative = |n: f64| if n < 0.0 { (len + n).max(0.0) } else { n.min(len) };
                    let start = relative(interp.to_integer(&arg(args, 0))?);
                    let end = match arg(args, 1) {
                        JsValue::Undefined => len,
                        v => relative(interp.to_integer(&v)?),
                    };
                    Ok(JsValue::String(s.substring(start as usize, end as usize)))
                }),
            ),
            ("split", 2, Rc::new(|interp, this, args| interp.string_split(this, args))),
            (
                "substring",
                2,
                Rc::new(|interp, this, args| {
                    let s = interp.this_str(this, "substring")?;
                    let start = clamp_index(interp.to_integer(&arg(args, 0))?, s.len());
                    let end = match arg(args, 1) {
                        JsValue::Undefined => s.len(),
                        v => clamp_index(interp.to_integer(&v)?, s.len()),
                    };
                    Ok(JsValue::String(s.substring(start.min(end), start.max(end))))
                }),
            ),
            (
                "substr",
                2,
                Rc::new(|interp, this, args| {
                    let s = interp.this_str(this, "substr")?;
                    let len = s.len() as f64;
                    let start = interp.to_integer(&arg(args, 0))?;
                    let start = if start < 0.0 { (len + start).max(0.0) } else { start.min(len) };
                    let count = match arg(args, 1) {
                        JsValue::Undefined => f64::INFINITY,
                        v => interp.to_integer(&v)?,
                    };
                    let count = count.max(0.0).min(len - start);
                    if count <= 0.0 {
                        return Ok(JsValue::from_str(""));
                    }
                    Ok(JsValue::String(s.substring(start as usize, (start + count) as usize)))
                }),
            ),
            (
                "toLowerCase",
                0,
                Rc::new(|interp, this, _args| Ok(JsValue::String(map_case(&interp.this_str(this, "toLowerCase")?, false)))),
            ),
            (
                "toLocaleLowerCase",
                0,
                Rc::new(|interp, this, _args| {
                    Ok(JsValue::String(map_case(&interp.this_str(this, "toLocaleLowerCase")?, false)))
                }),
            ),
            (
                "toUpperCase",
                0,
                Rc::new(|interp, this, _args| Ok(JsValue::String(map_case(&interp.this_str(this, "toUpperCase")?, true)))),
            ),
            (
                "toLocaleUpperCase",
                0,
                Rc::new(|interp, this, _args| {
                    Ok(JsValue::String(map_case(&interp.this_str(this, "toLocaleUpperCase")?, true)))
                }),
            ),
            (
                "trim",
                0,
                Rc::new(|interp, this, _args| {
                    let s = interp.this_str(this, "trim")?;
                    let units = &s.code_units;
                    let start = units.iter().position(|&u| !is_ecma_whitespace_unit(u)).unwrap_or(units.len());
                    let end = units.iter().rposition(|&u| !is_ecma_whitespace_unit(u)).map_or(start, |i| i + 1);
                    Ok(JsValue::String(s.substring(start, end)))
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
    fn wrappers_and_conversion() {
        assert_eq!(run("String(12) + String()"), "12");
        assert_eq!(run("typeof new String('a') + new String('ab').length"), "object2");
        assert_eq!(run("String.fromCharCode(72, 105, 65601)"), "HiA");
        assert!(run("String.prototype.toString.call(1)").starts_with("Uncaught TypeError"));
        assert!(run("String.prototype.trim.call(null)").starts_with("Uncaught TypeError"));
    }

    #[test]
    fn character_access() {
        assert_eq!(run("'abc'.charAt(1) + 'abc'.charAt(5) + 'abc'.charCodeAt(0)"), "b97");
        assert_eq!(run("isNaN('abc'.charCodeAt(-1))"), "true");
        assert_eq!(run("'abc'[1]"), "b");
    }

    #[test]
    fn searching() {
        assert_eq!(run("'abcabc'.indexOf('c') + ',' + 'abcabc'.indexOf('c', 3) + ',' + 'abc'.indexOf('z')"), "2,5,-1");
        assert_eq!(run("'abcabc'.lastIndexOf('a') + ',' + 'abcabc'.lastIndexOf('a', 2)"), "3,0");
        assert_eq!(run("'hello'.search(/l+/) + ',' + 'hello'.search('z')"), "2,-1");
        assert_eq!(run("'a'.localeCompare('b') + ',' + 'b'.localeCompare('b')"), "-1,0");
    }

    #[test]
    fn substrings() {
        assert_eq!(run("'abcdef'.slice(1, -1)"), "bcde");
        assert_eq!(run("'abcdef'.slice(-2)"), "ef");
        assert_eq!(run("'abcdef'.substring(4, 1)"), "bcd");
        assert_eq!(run("'abcdef'.substr(-3, 2)"), "de");
        assert_eq!(run("'abc'.substr(1)"), "bc");
        assert_eq!(run("'  \\t x y \\n'.trim()"), "x y");
        assert_eq!(run("'Abc'.toUpperCase() + 'ÄB'.toLowerCase()"), "ABCäb");
    }

    #[test]
    fn match_forms() {
        assert_eq!(run("'a1b22'.match(/\\d+/g)"), "1,22");
        assert_eq!(run("var m = 'a1b22'.match(/b(\\d)/); m[0] + m[1] + m.index"), "b223");
        assert_eq!(run("'abc'.match(/z/g)"), "null");
        assert_eq!(run("'aaa'.match(/a*?/g).length"), "4");
    }

    #[test]
    fn replace_forms() {
        assert_eq!(run("'aXbX'.replace('X', '-')"), "a-bX");
        assert_eq!(run("'aXbX'.replace(/X/g, '-')"), "a-b-");
        assert_eq!(run("'john smith'.replace(/(\\w+)\\s(\\w+)/, '$2, $1')"), "smith, john");
        assert_eq!(run("'abc'.replace('b', '[$&|$`|$\\'|$$]')"), "a[b|a|c|$]c");
        assert_eq!(
            run("'a1b2'.replace(/\\d/g, function (d, offset) { return '<' + d * 2 + '@' + offset + '>'; })"),
            "a<2@1>b<4@3>"
        );
        assert_eq!(run("'abc'.replace(/(z)?b/, '[$1]')"), "a[]c");
        assert_eq!(run("'x'.replace(/x/, '$9')"), "$9");
    }

    #[test]
    fn split_forms() {
        assert_eq!(run("'a,b,,c'.split(',').length"), "4");
        assert_eq!(run("'abc'.split('').join('|')"), "a|b|c");
        assert_eq!(run("'a,b,c'.split(',', 2).join('|')"), "a|b");
        assert_eq!(run("'abc'.split().length"), "1");
        assert_eq!(run("''.split(',').length + ',' + ''.split('').length"), "1,0");
        assert_eq!(run("'a1b22c'.split(/\\d+/).join('|')"), "a|b|c");
        assert_eq!(run("'a1b'.split(/(\\d)/).join('|')"), "a|1|b");
        assert_eq!(run("'ab'.split(/(?:)/).join('|')"), "a|b");
    }
}
