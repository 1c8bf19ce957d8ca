use super::*;

/// The array index named by `key`: its canonical decimal form, below 2^32 - 1.
pub(crate) fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || key.len() > 10 || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match key.parse::<u64>() {
        Ok(n) if n < u64::from(u32::MAX) => Some(n as u32),
        _ => None,
    }
}

enum DefineDispatch {
    Ordinary,
    Array,
    Arguments,
}

impl Interpreter {
    pub(crate) fn get_own_property(&self, o: JsObject, key: &str) -> Option<PropertyDescriptor> {
        let data = self.get_object(o);
        let data = data.borrow();
        if let Some(desc) = data.properties.get(key) {
            if let ObjectKind::Arguments(map) = &data.kind
                && let Some(param) = map.mapped.get(key)
            {
                let mut desc = desc.clone();
                desc.value = Some(map.env.borrow().binding_value(param));
                return Some(desc);
            }
            return Some(desc.clone());
        }
        if let ObjectKind::StringWrapper(s) = &data.kind
            && let Some(index) = array_index(key)
            && let Some(&unit) = s.code_units.get(index as usize)
        {
            return Some(PropertyDescriptor::data(
                JsValue::String(JsString::from_units(vec![unit])),
                false,
                true,
                false,
            ));
        }
        None
    }

    pub(crate) fn get_property(&self, o: JsObject, key: &str) -> Option<PropertyDescriptor> {
        let mut current = Some(o);
        while let Some(obj) = current {
            if let Some(desc) = self.get_own_property(obj, key) {
                return Some(desc);
            }
            current = self.get_object(obj).borrow().prototype;
        }
        None
    }

    pub(crate) fn get(&mut self, o: JsObject, key: &str) -> JsResult<JsValue> {
        self.get_with_receiver(o, key, &JsValue::Object(o))
    }

    /// `[[Get]]` where getters observe `receiver` as `this`; differs from the
    /// holder when reading through a primitive's wrapper.
    pub(crate) fn get_with_receiver(
        &mut self,
        o: JsObject,
        key: &str,
        receiver: &JsValue,
    ) -> JsResult<JsValue> {
        match self.get_property(o, key) {
            None => Ok(JsValue::Undefined),
            Some(desc) if desc.is_accessor_descriptor() => match desc.getter() {
                Some(getter) => {
                    let getter = getter.clone();
                    self.call(&getter, receiver.clone(), &[])
                }
                None => Ok(JsValue::Undefined),
            },
            Some(desc) => Ok(desc.value_or_undefined()),
        }
    }

    pub(crate) fn can_put(&self, o: JsObject, key: &str) -> bool {
        if let Some(desc) = self.get_own_property(o, key) {
            return if desc.is_accessor_descriptor() {
                desc.setter().is_some()
            } else {
                desc.writable()
            };
        }
        let (prototype, extensible) = {
            let data = self.get_object(o);
            let data = data.borrow();
            (data.prototype, data.extensible)
        };
        let Some(prototype) = prototype else {
            return extensible;
        };
        match self.get_property(prototype, key) {
            None => extensible,
            Some(inherited) if inherited.is_accessor_descriptor() => inherited.setter().is_some(),
            Some(inherited) => extensible && inherited.writable(),
        }
    }

    pub(crate) fn put(&mut self, o: JsObject, key: &str, value: JsValue, throw: bool) -> JsResult<()> {
        if !self.can_put(o, key) {
            if throw {
                return Err(JsError::type_error(format!(
                    "Cannot assign to read only property '{key}' of object"
                )));
            }
            return Ok(());
        }
        if let Some(own) = self.get_own_property(o, key)
            && own.is_data_descriptor()
        {
            let update = PropertyDescriptor {
                value: Some(value),
                ..Default::default()
            };
            self.define_own_property(o, key, update, throw)?;
            return Ok(());
        }
        if let Some(desc) = self.get_property(o, key)
            && desc.is_accessor_descriptor()
        {
            if let Some(setter) = desc.setter().cloned() {
                self.call(&setter, JsValue::Object(o), &[value])?;
            }
            return Ok(());
        }
        self.define_own_property(o, key, PropertyDescriptor::data_default(value), throw)?;
        Ok(())
    }

    pub(crate) fn has_property(&self, o: JsObject, key: &str) -> bool {
        self.get_property(o, key).is_some()
    }

    pub(crate) fn delete(&mut self, o: JsObject, key: &str, throw: bool) -> JsResult<bool> {
        let Some(desc) = self.get_own_property(o, key) else {
            return Ok(true);
        };
        if desc.configurable() {
            let data = self.get_object(o);
            let mut data = data.borrow_mut();
            data.properties.shift_remove(key);
            if let ObjectKind::Arguments(map) = &mut data.kind {
                map.mapped.remove(key);
            }
            return Ok(true);
        }
        if throw {
            return Err(JsError::type_error(format!("Cannot delete property '{key}'")));
        }
        Ok(false)
    }

    pub(crate) fn default_value(&mut self, o: JsObject, hint: Option<Hint>) -> JsResult<JsValue> {
        let hint = hint.unwrap_or_else(|| {
            if matches!(self.get_object(o).borrow().kind, ObjectKind::Date(_)) {
                Hint::String
            } else {
                Hint::Number
            }
        });
        let order = match hint {
            Hint::String => ["toString", "valueOf"],
            Hint::Number => ["valueOf", "toString"],
        };
        for name in order {
            let method = self.get(o, name)?;
            if self.is_callable(&method) {
                let result = self.call(&method, JsValue::Object(o), &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(JsError::type_error("Cannot convert object to primitive value"))
    }

    pub(crate) fn define_own_property(
        &mut self,
        o: JsObject,
        key: &str,
        desc: PropertyDescriptor,
        throw: bool,
    ) -> JsResult<bool> {
        let dispatch = match &self.get_object(o).borrow().kind {
            ObjectKind::Array => DefineDispatch::Array,
            ObjectKind::Arguments(_) => DefineDispatch::Arguments,
            _ => DefineDispatch::Ordinary,
        };
        match dispatch {
            DefineDispatch::Ordinary => self.define_ordinary_property(o, key, desc, throw),
            DefineDispatch::Array => self.define_array_property(o, key, desc, throw),
            DefineDispatch::Arguments => self.define_arguments_property(o, key, desc, throw),
        }
    }

    fn define_ordinary_property(
        &mut self,
        o: JsObject,
        key: &str,
        desc: PropertyDescriptor,
        throw: bool,
    ) -> JsResult<bool> {
        let reject = |message: String| {
            if throw {
                Err(JsError::type_error(message))
            } else {
                Ok(false)
            }
        };
        let data = self.get_object(o);
        let Some(current) = self.get_own_property(o, key) else {
            if !data.borrow().extensible {
                return reject(format!(
                    "Cannot define property {key}, object is not extensible"
                ));
            }
            data.borrow_mut()
                .properties
                .insert(key.to_string(), desc.completed());
            return Ok(true);
        };
        if desc.is_empty() || describes_same(&current, &desc) {
            return Ok(true);
        }
        let redefine = || format!("Cannot redefine property: {key}");
        if !current.configurable() {
            if desc.configurable() {
                return reject(redefine());
            }
            if desc.enumerable.is_some_and(|e| e != current.enumerable()) {
                return reject(redefine());
            }
        }
        let mut updated = current.clone();
        if desc.is_generic_descriptor() {
            // only enumerable/configurable change
        } else if current.is_data_descriptor() != desc.is_data_descriptor() {
            if !current.configurable() {
                return reject(redefine());
            }
            updated = if current.is_data_descriptor() {
                PropertyDescriptor {
                    get: Some(JsValue::Undefined),
                    set: Some(JsValue::Undefined),
                    enumerable: current.enumerable,
                    configurable: current.configurable,
                    ..Default::default()
                }
            } else {
                PropertyDescriptor {
                    value: Some(JsValue::Undefined),
                    writable: Some(false),
                    enumerable: current.enumerable,
                    configurable: current.configurable,
                    ..Default::default()
                }
            };
        } else if current.is_data_descriptor() {
            if !current.configurable() && !current.writable() {
                if desc.writable() {
                    return reject(redefine());
                }
                if let Some(value) = &desc.value
                    && !same_value(value, &current.value_or_undefined())
                {
                    return reject(redefine());
                }
            }
        } else if !current.configurable() {
            let differs = |new: &Option<JsValue>, old: &Option<JsValue>| match new {
                Some(new) => !same_value(new, old.as_ref().unwrap_or(&JsValue::Undefined)),
                None => false,
            };
            if differs(&desc.get, &current.get) || differs(&desc.set, &current.set) {
                return reject(redefine());
            }
        }

        if let Some(value) = desc.value {
            updated.value = Some(value);
        }
        if let Some(writable) = desc.writable {
            updated.writable = Some(writable);
        }
        if let Some(get) = desc.get {
            updated.get = Some(get);
        }
        if let Some(set) = desc.set {
            updated.set = Some(set);
        }
        if let Some(enumerable) = desc.enumerable {
            updated.enumerable = Some(enumerable);
        }
        if let Some(configurable) = desc.configurable {
            updated.configurable = Some(configurable);
        }
        data.borrow_mut().properties.insert(key.to_string(), updated);
        Ok(true)
    }

    fn array_length(&self, o: JsObject) -> (u32, bool) {
        match self.get_own_property(o, "length") {
            Some(desc) => {
                let len = match desc.value {
                    Some(JsValue::Number(n)) => number_ops::to_uint32(n),
                    _ => 0,
                };
                (len, desc.writable())
            }
            None => (0, true),
        }
    }

    fn define_array_property(
        &mut self,
        o: JsObject,
        key: &str,
        desc: PropertyDescriptor,
        throw: bool,
    ) -> JsResult<bool> {
        let reject = |message: String| {
            if throw {
                Err(JsError::type_error(message))
            } else {
                Ok(false)
            }
        };
        let (old_len, length_writable) = self.array_length(o);

        if key == "length" {
            let Some(value) = desc.value.clone() else {
                return self.define_ordinary_property(o, "length", desc, throw);
            };
            let number = self.to_number(&value)?;
            let new_len = number_ops::to_uint32(number);
            if f64::from(new_len) != number {
                return Err(JsError::range_error("Invalid array length"));
            }
            let mut new_desc = desc;
            new_desc.value = Some(JsValue::Number(f64::from(new_len)));
            if new_len >= old_len {
                return self.define_ordinary_property(o, "length", new_desc, throw);
            }
            if !length_writable {
                return reject("Cannot assign to read only property 'length'".to_string());
            }
            let final_writable = new_desc.writable.unwrap_or(true);
            new_desc.writable = Some(true);
            if !self.define_ordinary_property(o, "length", new_desc.clone(), throw)? {
                return Ok(false);
            }

            let mut doomed: Vec<u32> = self
                .get_object(o)
                .borrow()
                .properties
                .keys()
                .filter_map(|k| array_index(k))
                .filter(|&i| i >= new_len)
                .collect();
            doomed.sort_unstable_by(|a, b| b.cmp(a));
            for index in doomed {
                if !self.delete(o, &index.to_string(), false)? {
                    new_desc.value = Some(JsValue::Number(f64::from(index) + 1.0));
                    if !final_writable {
                        new_desc.writable = Some(false);
                    }
                    self.define_ordinary_property(o, "length", new_desc, false)?;
                    return reject(format!("Cannot delete array element {index}"));
                }
            }
            if !final_writable {
                let freeze = PropertyDescriptor {
                    writable: Some(false),
                    ..Default::default()
                };
                self.define_ordinary_property(o, "length", freeze, false)?;
            }
            return Ok(true);
        }

        if let Some(index) = array_index(key) {
            if index >= old_len && !length_writable {
                return reject(format!("Cannot add property {index}, array length is read only"));
            }
            if !self.define_ordinary_property(o, key, desc, false)? {
                return reject(format!("Cannot redefine property: {key}"));
            }
            if index >= old_len {
                let grown = PropertyDescriptor {
                    value: Some(JsValue::Number(f64::from(index) + 1.0)),
                    ..Default::default()
                };
                self.define_ordinary_property(o, "length", grown, false)?;
            }
            return Ok(true);
        }

        self.define_ordinary_property(o, key, desc, throw)
    }

    fn define_arguments_property(
        &mut self,
        o: JsObject,
        key: &str,
        desc: PropertyDescriptor,
        throw: bool,
    ) -> JsResult<bool> {
        let mapping = match &self.get_object(o).borrow().kind {
            ObjectKind::Arguments(map) => map
                .mapped
                .get(key)
                .map(|param| (map.env.clone(), param.clone())),
            _ => None,
        };
        if !self.define_ordinary_property(o, key, desc.clone(), false)? {
            if throw {
                return Err(JsError::type_error(format!("Cannot redefine property: {key}")));
            }
            return Ok(false);
        }
        if let Some((env, param)) = mapping {
            let sever = if desc.is_accessor_descriptor() {
                true
            } else {
                if let Some(value) = desc.value {
                    env.borrow_mut().set_binding_value(&param, value);
                }
                desc.writable == Some(false)
            };
            if sever && let ObjectKind::Arguments(map) = &mut self.get_object(o).borrow_mut().kind {
                map.mapped.remove(key);
            }
        }
        Ok(true)
    }

    /// Own property names in enumeration order; string indices come first.
    pub(crate) fn own_property_keys(&self, o: JsObject) -> Vec<String> {
        let data = self.get_object(o);
        let data = data.borrow();
        let mut keys = Vec::with_capacity(data.properties.len());
        if let ObjectKind::StringWrapper(s) = &data.kind {
            keys.extend((0..s.len()).map(|i| i.to_string()));
        }
        keys.extend(data.properties.keys().cloned());
        keys
    }
}

/// Every field present in `desc` already holds the same value in `current`.
fn describes_same(current: &PropertyDescriptor, desc: &PropertyDescriptor) -> bool {
    fn same_opt<T: PartialEq>(new: &Option<T>, old: &Option<T>) -> bool {
        new.is_none() || new == old
    }
    fn same_value_opt(new: &Option<JsValue>, old: &Option<JsValue>) -> bool {
        match (new, old) {
            (None, _) => true,
            (Some(a), Some(b)) => same_value(a, b),
            (Some(_), None) => false,
        }
    }
    same_value_opt(&desc.value, &current.value)
        && same_value_opt(&desc.get, &current.get)
        && same_value_opt(&desc.set, &current.set)
        && same_opt(&desc.writable, &current.writable)
        && same_opt(&desc.enumerable, &current.enumerable)
        && same_opt(&desc.configurable, &current.configurable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: &JsValue) -> f64 {
        match v {
            JsValue::Number(n) => *n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn array_index_parsing() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("42"), Some(42));
        assert_eq!(array_index("4294967294"), Some(4294967294));
        assert_eq!(array_index("4294967295"), None);
        assert_eq!(array_index("01"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("1.5"), None);
        assert_eq!(array_index(""), None);
    }

    #[test]
    fn prototype_chain_lookup_and_shadowing() {
        let mut interp = Interpreter::new();
        let parent = interp.create_object();
        let child = interp.create_object();
        interp.get_object(child).borrow_mut().prototype = Some(parent);
        interp.put(parent, "x", JsValue::Number(1.0), true).unwrap();
        assert_eq!(num(&interp.get(child, "x").unwrap()), 1.0);
        interp.put(child, "x", JsValue::Number(2.0), true).unwrap();
        assert_eq!(num(&interp.get(child, "x").unwrap()), 2.0);
        assert_eq!(num(&interp.get(parent, "x").unwrap()), 1.0);
    }

    #[test]
    fn redundant_define_is_idempotent() {
        let mut interp = Interpreter::new();
        let o = interp.create_object();
        let desc = PropertyDescriptor::data(JsValue::Number(1.0), false, false, false);
        assert!(interp.define_own_property(o, "k", desc.clone(), false).unwrap());
        assert!(interp.define_own_property(o, "k", desc, false).unwrap());
        let stored = interp.get_own_property(o, "k").unwrap();
        assert!(!stored.writable() && !stored.configurable());
    }

    #[test]
    fn non_configurable_rejects_changes() {
        let mut interp = Interpreter::new();
        let o = interp.create_object();
        let desc = PropertyDescriptor::data(JsValue::Number(1.0), false, true, false);
        interp.define_own_property(o, "k", desc, true).unwrap();
        let change = PropertyDescriptor {
            value: Some(JsValue::Number(2.0)),
            ..Default::default()
        };
        assert!(!interp.define_own_property(o, "k", change.clone(), false).unwrap());
        assert!(interp.define_own_property(o, "k", change, true).is_err());
        let to_accessor =
            PropertyDescriptor::accessor(JsValue::Undefined, JsValue::Undefined, true, false);
        assert!(!interp.define_own_property(o, "k", to_accessor, false).unwrap());
    }

    #[test]
    fn writable_may_always_be_cleared() {
        let mut interp = Interpreter::new();
        let o = interp.create_object();
        let desc = PropertyDescriptor::data(JsValue::Number(1.0), true, true, false);
        interp.define_own_property(o, "k", desc, true).unwrap();
        let freeze = PropertyDescriptor {
            writable: Some(false),
            ..Default::default()
        };
        assert!(interp.define_own_property(o, "k", freeze, true).unwrap());
        assert!(!interp.can_put(o, "k"));
    }

    #[test]
    fn array_length_tracks_indices() {
        let mut interp = Interpreter::new();
        let arr = interp.create_array(vec![]);
        interp.put(arr, "4", JsValue::Null, true).unwrap();
        assert_eq!(num(&interp.get(arr, "length").unwrap()), 5.0);
        interp.put(arr, "length", JsValue::Number(2.0), true).unwrap();
        assert!(interp.get_own_property(arr, "4").is_none());
        assert!(matches!(
            interp.put(arr, "length", JsValue::Number(1.5), true),
            Err(JsError::Native {
                kind: ErrorKind::Range,
                ..
            })
        ));
    }

    #[test]
    fn array_shrink_stops_at_non_configurable_element() {
        let mut interp = Interpreter::new();
        let arr = interp.create_array(vec![JsValue::Number(0.0); 5]);
        let pinned = PropertyDescriptor::data(JsValue::Number(2.0), true, true, false);
        interp.define_own_property(arr, "2", pinned, true).unwrap();
        let shrink = PropertyDescriptor {
            value: Some(JsValue::Number(0.0)),
            ..Default::default()
        };
        assert!(!interp.define_own_property(arr, "length", shrink, false).unwrap());
        assert_eq!(num(&interp.get(arr, "length").unwrap()), 3.0);
        assert!(interp.get_own_property(arr, "3").is_none());
        assert!(interp.get_own_property(arr, "2").is_some());
    }

    #[test]
    fn string_wrapper_exposes_indices() {
        let mut interp = Interpreter::new();
        let s = interp.to_object(&JsValue::from_str("hi")).unwrap();
        let desc = interp.get_own_property(s, "1").unwrap();
        assert!(!desc.writable() && desc.enumerable());
        assert_eq!(interp.own_property_keys(s), vec!["0", "1", "length"]);
        assert!(!interp.delete(s, "0", false).unwrap());
    }

    #[test]
    fn delete_respects_configurability() {
        let mut interp = Interpreter::new();
        let o = interp.create_object();
        interp.put(o, "a", JsValue::Null, true).unwrap();
        let fixed = PropertyDescriptor::data(JsValue::Null, true, true, false);
        interp.define_own_property(o, "b", fixed, true).unwrap();
        assert!(interp.delete(o, "a", true).unwrap());
        assert!(!interp.delete(o, "b", false).unwrap());
        assert!(interp.delete(o, "b", true).is_err());
        assert!(interp.delete(o, "missing", true).unwrap());
    }
}
