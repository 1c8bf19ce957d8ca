use super::*;
use std::cmp::Ordering;

/// Clamps a relative index argument against `len` (negative counts from the end).
fn relative_index(rel: f64, len: f64) -> f64 {
    if rel < 0.0 {
        (len + rel).max(0.0)
    } else {
        rel.min(len)
    }
}

fn key(i: f64) -> String {
    number_ops::to_string(i)
}

impl Interpreter {
    /// `this` as an object plus ToUint32 of its `length`.
    fn array_like(&mut self, this: &JsValue) -> JsResult<(JsObject, f64)> {
        let o = self.to_object(this)?;
        let length = self.get(o, "length")?;
        let len = self.to_uint32(&length)?;
        Ok((o, f64::from(len)))
    }

    fn create_data_property(&mut self, o: JsObject, key: &str, value: JsValue) -> JsResult<()> {
        self.define_own_property(o, key, PropertyDescriptor::data_default(value), true)?;
        Ok(())
    }

    fn set_length(&mut self, o: JsObject, len: f64) -> JsResult<()> {
        self.put(o, "length", JsValue::Number(len), true)
    }

    pub(crate) fn is_array_object(&self, v: &JsValue) -> bool {
        match v {
            JsValue::Object(o) => self.get_object(*o).borrow().is_array(),
            _ => false,
        }
    }

    fn construct_array(&mut self, args: &[JsValue]) -> JsResult<JsValue> {
        if let [JsValue::Number(n)] = args {
            if f64::from(number_ops::to_uint32(*n)) != *n {
                return Err(JsError::range_error("Invalid array length"));
            }
            let a = self.create_array(Vec::new());
            self.set_length(a, *n)?;
            return Ok(JsValue::Object(a));
        }
        Ok(JsValue::Object(self.create_array(args.to_vec())))
    }

    /// SortCompare (15.4.4.11): undefined sorts last, then the comparator or string order.
    fn sort_compare(&mut self, comparefn: &JsValue, x: &JsValue, y: &JsValue) -> JsResult<Ordering> {
        match (x.is_undefined(), y.is_undefined()) {
            (true, true) => return Ok(Ordering::Equal),
            (true, false) => return Ok(Ordering::Greater),
            (false, true) => return Ok(Ordering::Less),
            _ => {}
        }
        if !comparefn.is_undefined() {
            let result = self.call(comparefn, JsValue::Undefined, &[x.clone(), y.clone()])?;
            let n = self.to_number(&result)?;
            return Ok(n.partial_cmp(&0.0).unwrap_or(Ordering::Equal));
        }
        let xs = self.to_string(x)?;
        let ys = self.to_string(y)?;
        Ok(xs.cmp(&ys))
    }

    /// Stable merge sort whose comparator may throw.
    fn merge_sort(&mut self, items: Vec<JsValue>, comparefn: &JsValue) -> JsResult<Vec<JsValue>> {
        if items.len() <= 1 {
            return Ok(items);
        }
        let mut left = items;
        let right = left.split_off(left.len() / 2);
        let left = self.merge_sort(left, comparefn)?;
        let right = self.merge_sort(right, comparefn)?;
        let mut merged = Vec::with_capacity(left.len() + right.len());
        let mut left = left.into_iter().peekable();
        let mut right = right.into_iter().peekable();
        while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
            let take_right = self.sort_compare(comparefn, l, r)? == Ordering::Greater;
            let next = if take_right { right.next() } else { left.next() };
            merged.extend(next);
        }
        merged.extend(left);
        merged.extend(right);
        Ok(merged)
    }

    /// Shared driver of the iteration methods; `visit` returns `Some` to stop early.
    fn for_each_present(
        &mut self,
        this: &JsValue,
        args: &[JsValue],
        method: &str,
        mut visit: impl FnMut(&mut Self, f64, JsValue, JsValue) -> JsResult<Option<JsValue>>,
    ) -> JsResult<Option<JsValue>> {
        let (o, len) = self.array_like(this)?;
        let callback = self.callback_arg(args, 0, method)?;
        let this_arg = arg(args, 1);
        let mut k = 0.0;
        while k < len {
            let pk = key(k);
            if self.has_property(o, &pk) {
                let value = self.get(o, &pk)?;
                let result = self.call(
                    &callback,
                    this_arg.clone(),
                    &[value.clone(), JsValue::Number(k), JsValue::Object(o)],
                )?;
                if let Some(stop) = visit(self, k, value, result)? {
                    return Ok(Some(stop));
                }
            }
            k += 1.0;
        }
        Ok(None)
    }

    fn reduce_array(&mut self, this: &JsValue, args: &[JsValue], from_right: bool) -> JsResult<JsValue> {
        let method = if from_right { "reduceRight" } else { "reduce" };
        let (o, len) = self.array_like(this)?;
        let callback = self.callback_arg(args, 0, method)?;
        let mut indices: Box<dyn Iterator<Item = f64>> = if from_right {
            Box::new((0..len as u64).rev().map(|i| i as f64))
        } else {
            Box::new((0..len as u64).map(|i| i as f64))
        };
        let mut accumulator = if args.len() >= 2 {
            args[1].clone()
        } else {
            loop {
                let Some(k) = indices.next() else {
                    return Err(JsError::type_error("Reduce of empty array with no initial value"));
                };
                let pk = key(k);
                if self.has_property(o, &pk) {
                    break self.get(o, &pk)?;
                }
            }
        };
        for k in indices {
            let pk = key(k);
            if self.has_property(o, &pk) {
                let value = self.get(o, &pk)?;
                accumulator = self.call(
                    &callback,
                    JsValue::Undefined,
                    &[accumulator, value, JsValue::Number(k), JsValue::Object(o)],
                )?;
            }
        }
        Ok(accumulator)
    }

    fn join_array(&mut self, this: &JsValue, separator: &JsValue, locale: bool) -> JsResult<JsValue> {
        let (o, len) = self.array_like(this)?;
        let separator = if separator.is_undefined() {
            JsString::from_str(",")
        } else {
            self.to_string(separator)?
        };
        let mut out: Vec<u16> = Vec::new();
        let mut k = 0.0;
        while k < len {
            if k > 0.0 {
                out.extend_from_slice(&separator.code_units);
            }
            let element = self.get(o, &key(k))?;
            if !element.is_nullish() {
                let s = if locale {
                    let obj = self.to_object(&element)?;
                    let f = self.get(obj, "toLocaleString")?;
                    if !self.is_callable(&f) {
                        return Err(JsError::type_error("toLocaleString is not a function"));
                    }
                    let v = self.call(&f, JsValue::Object(obj), &[])?;
                    self.to_string(&v)?
                } else {
                    self.to_string(&element)?
                };
                out.extend_from_slice(&s.code_units);
            }
            k += 1.0;
        }
        Ok(JsValue::String(JsString::from_units(out)))
    }

    pub(crate) fn setup_array(&mut self) {
        let proto = self.realm.array_prototype;
        let ctor = self.native_constructor(
            "Array",
            1,
            Rc::new(|interp, _this, args| interp.construct_array(args)),
            Rc::new(|interp, args| interp.construct_array(args)),
            proto,
        );
        let statics: Methods = vec![(
            "isArray",
            1,
            Rc::new(|interp, _this, args| Ok(JsValue::Boolean(interp.is_array_object(&arg(args, 0))))),
        )];
        self.define_methods(ctor, statics);

        let methods: Methods = vec![
            ("toString", 0, Rc::new(array_to_string)),
            (
                "toLocaleString",
                0,
                Rc::new(|interp, this, _args| interp.join_array(this, &JsValue::Undefined, true)),
            ),
            (
                "join",
                1,
                Rc::new(|interp, this, args| interp.join_array(this, &arg(args, 0), false)),
            ),
            ("concat", 1, Rc::new(array_concat)),
            ("pop", 0, Rc::new(array_pop)),
            ("push", 1, Rc::new(array_push)),
            ("reverse", 0, Rc::new(array_reverse)),
            ("shift", 0, Rc::new(array_shift)),
            ("unshift", 1, Rc::new(array_unshift)),
            ("slice", 2, Rc::new(array_slice)),
            ("splice", 2, Rc::new(array_splice)),
            ("sort", 1, Rc::new(array_sort)),
            ("indexOf", 1, Rc::new(array_index_of)),
            ("lastIndexOf", 1, Rc::new(array_last_index_of)),
            (
                "every",
                1,
                Rc::new(|interp, this, args| {
                    let stopped = interp.for_each_present(this, args, "every", |_, _, _, result| {
                        Ok((!to_boolean(&result)).then_some(JsValue::Boolean(false)))
                    })?;
                    Ok(stopped.unwrap_or(JsValue::Boolean(true)))
                }),
            ),
            (
                "some",
                1,
                Rc::new(|interp, this, args| {
                    let stopped = interp.for_each_present(this, args, "some", |_, _, _, result| {
                        Ok(to_boolean(&result).then_some(JsValue::Boolean(true)))
                    })?;
                    Ok(stopped.unwrap_or(JsValue::Boolean(false)))
                }),
            ),
            (
                "forEach",
                1,
                Rc::new(|interp, this, args| {
                    interp.for_each_present(this, args, "forEach", |_, _, _, _| Ok(None))?;
                    Ok(JsValue::Undefined)
                }),
            ),
            (
                "map",
                1,
                Rc::new(|interp, this, args| {
                    let (_, len) = interp.array_like(this)?;
                    let a = interp.create_array(Vec::new());
                    interp.set_length(a, len)?;
                    interp.for_each_present(this, args, "map", |interp, k, _, result| {
                        interp.create_data_property(a, &key(k), result)?;
                        Ok(None)
                    })?;
                    Ok(JsValue::Object(a))
                }),
            ),
            (
                "filter",
                1,
                Rc::new(|interp, this, args| {
                    let mut kept = Vec::new();
                    interp.for_each_present(this, args, "filter", |_, _, value, result| {
                        if to_boolean(&result) {
                            kept.push(value);
                        }
                        Ok(None)
                    })?;
                    Ok(JsValue::Object(interp.create_array(kept)))
                }),
            ),
            (
                "reduce",
                1,
                Rc::new(|interp, this, args| interp.reduce_array(this, args, false)),
            ),
            (
                "reduceRight",
                1,
                Rc::new(|interp, this, args| interp.reduce_array(this, args, true)),
            ),
        ];
        self.define_methods(proto, methods);
    }
}

fn array_to_string(interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> JsResult<JsValue> {
    let o = interp.to_object(this)?;
    let join = interp.get(o, "join")?;
    if interp.is_callable(&join) {
        return interp.call(&join, JsValue::Object(o), &[]);
    }
    let class = interp.get_object(o).borrow().class_name;
    Ok(JsValue::from_str(&format!("[object {class}]")))
}

fn array_concat(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    let o = interp.to_object(this)?;
    let a = interp.create_array(Vec::new());
    let mut n = 0.0;
    let items = std::iter::once(JsValue::Object(o)).chain(args.iter().cloned());
    for item in items {
        match item {
            JsValue::Object(e) if interp.get_object(e).borrow().is_array() => {
                let length = interp.get(e, "length")?;
                let len = f64::from(interp.to_uint32(&length)?);
                let mut k = 0.0;
                while k < len {
                    let pk = key(k);
                    if interp.has_property(e, &pk) {
                        let value = interp.get(e, &pk)?;
                        interp.create_data_property(a, &key(n), value)?;
                    }
                    n += 1.0;
                    k += 1.0;
                }
            }
            other => {
                interp.create_data_property(a, &key(n), other)?;
                n += 1.0;
            }
        }
    }
    interp.set_length(a, n)?;
    Ok(JsValue::Object(a))
}

fn array_pop(interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> JsResult<JsValue> {
    let (o, len) = interp.array_like(this)?;
    if len == 0.0 {
        interp.set_length(o, 0.0)?;
        return Ok(JsValue::Undefined);
    }
    let index = key(len - 1.0);
    let element = interp.get(o, &index)?;
    interp.delete(o, &index, true)?;
    interp.set_length(o, len - 1.0)?;
    Ok(element)
}

fn array_push(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    let (o, mut n) = interp.array_like(this)?;
    for value in args {
        interp.put(o, &key(n), value.clone(), true)?;
        n += 1.0;
    }
    interp.set_length(o, n)?;
    Ok(JsValue::Number(n))
}

fn array_reverse(interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> JsResult<JsValue> {
    let (o, len) = interp.array_like(this)?;
    let middle = (len / 2.0).floor();
    let mut lower = 0.0;
    while lower != middle {
        let upper = len - lower - 1.0;
        let (lower_key, upper_key) = (key(lower), key(upper));
        let lower_exists = interp.has_property(o, &lower_key);
        let upper_exists = interp.has_property(o, &upper_key);
        let lower_value = if lower_exists { interp.get(o, &lower_key)? } else { JsValue::Undefined };
        let upper_value = if upper_exists { interp.get(o, &upper_key)? } else { JsValue::Undefined };
        match (lower_exists, upper_exists) {
            (true, true) => {
                interp.put(o, &lower_key, upper_value, true)?;
                interp.put(o, &upper_key, lower_value, true)?;
            }
            (false, true) => {
                interp.put(o, &lower_key, upper_value, true)?;
                interp.delete(o, &upper_key, true)?;
            }
            (true, false) => {
                interp.delete(o, &lower_key, true)?;
                interp.put(o, &upper_key, lower_value, true)?;
            }
            (false, false) => {}
        }
        lower += 1.0;
    }
    Ok(JsValue::Object(o))
}

/// Moves the elements in `from..len` by `shift` positions, keeping holes.
fn move_elements(interp: &mut Interpreter, o: JsObject, from: f64, len: f64, shift: f64) -> JsResult<()> {
    let mut visit = |interp: &mut Interpreter, k: f64| -> JsResult<()> {
        let source = key(k);
        let target = key(k + shift);
        if interp.has_property(o, &source) {
            let value = interp.get(o, &source)?;
            interp.put(o, &target, value, true)?;
        } else {
            interp.delete(o, &target, true)?;
        }
        Ok(())
    };
    if shift < 0.0 {
        let mut k = from;
        while k < len {
            visit(interp, k)?;
            k += 1.0;
        }
    } else {
        let mut k = len;
        while k > from {
            k -= 1.0;
            visit(interp, k)?;
        }
    }
    Ok(())
}

fn array_shift(interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> JsResult<JsValue> {
    let (o, len) = interp.array_like(this)?;
    if len == 0.0 {
        interp.set_length(o, 0.0)?;
        return Ok(JsValue::Undefined);
    }
    let first = interp.get(o, "0")?;
    move_elements(interp, o, 1.0, len, -1.0)?;
    interp.delete(o, &key(len - 1.0), true)?;
    interp.set_length(o, len - 1.0)?;
    Ok(first)
}

fn array_unshift(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    let (o, len) = interp.array_like(this)?;
    let count = args.len() as f64;
    move_elements(interp, o, 0.0, len, count)?;
    for (j, value) in args.iter().enumerate() {
        interp.put(o, &key(j as f64), value.clone(), true)?;
    }
    interp.set_length(o, len + count)?;
    Ok(JsValue::Number(len + count))
}

fn array_slice(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    let (o, len) = interp.array_like(this)?;
    let start = interp.to_integer(&arg(args, 0))?;
    let mut k = relative_index(start, len);
    let end = match arg(args, 1) {
        JsValue::Undefined => len,
        v => relative_index(interp.to_integer(&v)?, len),
    };
    let a = interp.create_array(Vec::new());
    let mut n = 0.0;
    while k < end {
        let pk = key(k);
        if interp.has_property(o, &pk) {
            let value = interp.get(o, &pk)?;
            interp.create_data_property(a, &key(n), value)?;
        }
        k += 1.0;
        n += 1.0;
    }
    interp.set_length(a, n)?;
    Ok(JsValue::Object(a))
}

fn array_splice(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    let (o, len) = interp.array_like(this)?;
    let start = relative_index(interp.to_integer(&arg(args, 0))?, len);
    let delete_count = match args.len() {
        0 => 0.0,
        1 => len - start,
        _ => interp.to_integer(&args[1])?.max(0.0).min(len - start),
    };
    let removed = interp.create_array(Vec::new());
    let mut k = 0.0;
    while k < delete_count {
        let from = key(start + k);
        if interp.has_property(o, &from) {
            let value = interp.get(o, &from)?;
            interp.create_data_property(removed, &key(k), value)?;
        }
        k += 1.0;
    }
    interp.set_length(removed, delete_count)?;

    let items = args.get(2..).unwrap_or_default();
    let item_count = items.len() as f64;
    if item_count < delete_count {
        move_elements(interp, o, start + delete_count, len, item_count - delete_count)?;
        let mut k = len;
        while k > len - delete_count + item_count {
            interp.delete(o, &key(k - 1.0), true)?;
            k -= 1.0;
        }
    } else if item_count > delete_count {
        move_elements(interp, o, start + delete_count, len, item_count - delete_count)?;
    }
    for (j, value) in items.iter().enumerate() {
        interp.put(o, &key(start + j as f64), value.clone(), true)?;
    }
    interp.set_length(o, len - delete_count + item_count)?;
    Ok(JsValue::Object(removed))
}

fn array_sort(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    let comparefn = arg(args, 0);
    if !comparefn.is_undefined() && !interp.is_callable(&comparefn) {
        return Err(JsError::type_error("The comparison function must be either a function or undefined"));
    }
    let (o, len) = interp.array_like(this)?;
    let mut present = Vec::new();
    let mut k = 0.0;
    while k < len {
        let pk = key(k);
        if interp.has_property(o, &pk) {
            present.push(interp.get(o, &pk)?);
        }
        k += 1.0;
    }
    let count = present.len() as f64;
    let sorted = interp.merge_sort(present, &comparefn)?;
    for (i, value) in sorted.into_iter().enumerate() {
        interp.put(o, &key(i as f64), value, true)?;
    }
    let mut k = count;
    while k < len {
        interp.delete(o, &key(k), true)?;
        k += 1.0;
    }
    Ok(JsValue::Object(o))
}

fn array_index_of(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    let (o, len) = interp.array_like(this)?;
    if len == 0.0 {
        return Ok(JsValue::Number(-1.0));
    }
    let n = match args.get(1) {
        Some(v) => interp.to_integer(v)?,
        None => 0.0,
    };
    if n >= len {
        return Ok(JsValue::Number(-1.0));
    }
    let target = arg(args, 0);
    let mut k = if n >= 0.0 { n } else { (len + n).max(0.0) };
    while k < len {
        let pk = key(k);
        if interp.has_property(o, &pk) && strict_equals(&interp.get(o, &pk)?, &target) {
            return Ok(JsValue::Number(k));
        }
        k += 1.0;
    }
    Ok(JsValue::Number(-1.0))
}

fn array_last_index_of(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    let (o, len) = interp.array_like(this)?;
    if len == 0.0 {
        return Ok(JsValue::Number(-1.0));
    }
    let n = match args.get(1) {
        Some(v) => interp.to_integer(v)?,
        None => len - 1.0,
    };
    let target = arg(args, 0);
    let mut k = if n >= 0.0 { n.min(len - 1.0) } else { len + n };
    while k >= 0.0 {
        let pk = key(k);
        if interp.has_property(o, &pk) && strict_equals(&interp.get(o, &pk)?, &target) {
            return Ok(JsValue::Number(k));
        }
        k -= 1.0;
    }
    Ok(JsValue::Number(-1.0))
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
    fn constructor_forms() {
        assert_eq!(run("new Array(3).length"), "3");
        assert_eq!(run("Array(1, 2, 3)"), "1,2,3");
        assert_eq!(run("new Array('3').length"), "1");
        assert_eq!(run("new Array(-1)"), "Uncaught RangeError: Invalid array length");
        assert_eq!(run("Array.isArray([]) && !Array.isArray({length: 0})"), "true");
    }

    #[test]
    fn stack_and_queue_operations() {
        assert_eq!(run("var a = [1, 2]; a.push(3, 4) + ':' + a"), "4:1,2,3,4");
        assert_eq!(run("var a = [1, 2]; a.pop() + ':' + a.length"), "2:1");
        assert_eq!(run("var a = [1, 2, 3]; a.shift() + ':' + a"), "1:2,3");
        assert_eq!(run("var a = [3]; a.unshift(1, 2) + ':' + a"), "3:1,2,3");
        assert_eq!(run("[].pop() === undefined"), "true");
    }

    #[test]
    fn generic_over_array_likes() {
        assert_eq!(
            run("var o = {length: 2, 0: 'a', 1: 'b'}; Array.prototype.push.call(o, 'c'); o.length + Array.prototype.join.call(o, '-')"),
            "3a-b-c"
        );
        assert_eq!(
            run("(function () { return Array.prototype.slice.call(arguments, 1); })(1, 2, 3)"),
            "2,3"
        );
    }

    #[test]
    fn slice_splice_concat() {
        assert_eq!(run("[1, 2, 3, 4].slice(-2)"), "3,4");
        assert_eq!(run("[1, 2, 3, 4].slice(1, -1)"), "2,3");
        assert_eq!(run("var a = [1, 2, 3, 4]; var r = a.splice(1, 2, 'x'); a + '|' + r"), "1,x,4|2,3");
        assert_eq!(run("var a = [1, 2]; a.splice(1, 0, 'a', 'b'); a"), "1,a,b,2");
        assert_eq!(run("var a = [1, 2, 3]; a.splice(1); a"), "1");
        assert_eq!(run("[1].concat([2, 3], 4, [[5]]).length"), "5");
        assert_eq!(run("[, 1].concat([2, ,]).length"), "4");
    }

    #[test]
    fn join_and_reverse() {
        assert_eq!(run("[1, null, undefined, 2].join('-')"), "1---2");
        assert_eq!(run("[1, 2, 3].reverse()"), "3,2,1");
        assert_eq!(run("var a = [1, , 3, ]; a.reverse(); (1 in a) + ':' + a"), "false:3,,1");
    }

    #[test]
    fn sort_orders() {
        assert_eq!(run("[10, 9, 1, 2].sort()"), "1,10,2,9");
        assert_eq!(run("[10, 9, 1, 2].sort(function (a, b) { return a - b; })"), "1,2,9,10");
        assert_eq!(run("var a = [3, undefined, 1, , 2]; a.sort(); a.length + ':' + a"), "5:1,2,3,,");
        assert_eq!(
            run("try { [2, 1].sort(function () { throw 'stop'; }); } catch (e) { e }"),
            "stop"
        );
    }

    #[test]
    fn searching() {
        assert_eq!(run("[1, 2, 3, 2].indexOf(2)"), "1");
        assert_eq!(run("[1, 2, 3, 2].lastIndexOf(2)"), "3");
        assert_eq!(run("[1, 2, 3].indexOf(1, -2)"), "-1");
        assert_eq!(run("[NaN].indexOf(NaN)"), "-1");
    }

    #[test]
    fn iteration_methods() {
        assert_eq!(run("[1, 2, 3].map(function (x) { return x * 2; })"), "2,4,6");
        assert_eq!(run("[1, 2, 3, 4].filter(function (x) { return x % 2; })"), "1,3");
        assert_eq!(run("[1, 2, 3].every(function (x) { return x > 0; })"), "true");
        assert_eq!(run("[1, 2, 3].some(function (x) { return x > 2; })"), "true");
        assert_eq!(run("var s = 0; [1, , 3].forEach(function (x) { s += x; }); s"), "4");
        assert_eq!(run("[1, 2, 3].reduce(function (a, b) { return a + b; })"), "6");
        assert_eq!(run("['a', 'b'].reduceRight(function (a, b) { return a + b; }, '')"), "ba");
        assert!(run("[].reduce(function () {})").starts_with("Uncaught TypeError"));
        assert!(run("[1].map(5)").starts_with("Uncaught TypeError"));
        assert_eq!(run("var o = {k: 2}; [1].map(function (x) { return x * this.k; }, o)"), "2");
    }

    #[test]
    fn map_preserves_holes_and_length() {
        assert_eq!(run("var m = [1, , 3].map(function (x) { return x; }); m.length + ':' + (1 in m)"), "3:false");
    }
}
