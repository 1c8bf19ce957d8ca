use super::*;

fn require_object(v: &JsValue, method: &str) -> JsResult<JsObject> {
    match v {
        JsValue::Object(o) => Ok(*o),
        other => Err(JsError::type_error(format!(
            "Object.{method} called on non-object {}",
            primitive_to_string(other)
        ))),
    }
}

impl Interpreter {
    /// ToPropertyDescriptor (8.10.5): reads the attribute fields through [[Get]].
    pub(crate) fn to_property_descriptor(&mut self, v: &JsValue) -> JsResult<PropertyDescriptor> {
        let JsValue::Object(o) = v else {
            return Err(JsError::type_error(format!(
                "Property description must be an object: {}",
                primitive_to_string(v)
            )));
        };
        let o = *o;
        let mut desc = PropertyDescriptor::default();
        if self.has_property(o, "enumerable") {
            desc.enumerable = Some(to_boolean(&self.get(o, "enumerable")?));
        }
        if self.has_property(o, "configurable") {
            desc.configurable = Some(to_boolean(&self.get(o, "configurable")?));
        }
        if self.has_property(o, "value") {
            desc.value = Some(self.get(o, "value")?);
        }
        if self.has_property(o, "writable") {
            desc.writable = Some(to_boolean(&self.get(o, "writable")?));
        }
        for (key, what) in [("get", "Getter"), ("set", "Setter")] {
            if !self.has_property(o, key) {
                continue;
            }
            let accessor = self.get(o, key)?;
            if !accessor.is_undefined() && !self.is_callable(&accessor) {
                return Err(JsError::type_error(format!(
                    "{what} must be a function: {}",
                    self.describe_value(&accessor)
                )));
            }
            if key == "get" {
                desc.get = Some(accessor);
            } else {
                desc.set = Some(accessor);
            }
        }
        if desc.is_accessor_descriptor() && desc.is_data_descriptor() {
            return Err(JsError::type_error(
                "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
            ));
        }
        Ok(desc)
    }

    /// FromPropertyDescriptor (8.10.4).
    pub(crate) fn from_property_descriptor(&mut self, desc: Option<PropertyDescriptor>) -> JsValue {
        let Some(desc) = desc else {
            return JsValue::Undefined;
        };
        let result = self.create_object();
        let data = self.get_object(result);
        let mut data = data.borrow_mut();
        if desc.is_accessor_descriptor() {
            data.insert_value("get".to_string(), desc.getter().cloned().unwrap_or(JsValue::Undefined));
            data.insert_value("set".to_string(), desc.setter().cloned().unwrap_or(JsValue::Undefined));
        } else {
            data.insert_value("value".to_string(), desc.value_or_undefined());
            data.insert_value("writable".to_string(), JsValue::Boolean(desc.writable()));
        }
        data.insert_value("enumerable".to_string(), JsValue::Boolean(desc.enumerable()));
        data.insert_value("configurable".to_string(), JsValue::Boolean(desc.configurable()));
        JsValue::Object(result)
    }

    fn define_properties(&mut self, o: JsObject, properties: &JsValue) -> JsResult<()> {
        let props = self.to_object(properties)?;
        let mut descriptors = Vec::new();
        for key in self.own_property_keys(props) {
            if !self.get_own_property(props, &key).is_some_and(|d| d.enumerable()) {
                continue;
            }
            let desc_obj = self.get(props, &key)?;
            descriptors.push((key, self.to_property_descriptor(&desc_obj)?));
        }
        for (key, desc) in descriptors {
            self.define_own_property(o, &key, desc, true)?;
        }
        Ok(())
    }

    /// Replaces `[[Prototype]]`, refusing cycles and changes to non-extensible objects.
    pub(crate) fn set_prototype(&mut self, o: JsObject, proto: Option<JsObject>) -> JsResult<()> {
        let current = self.get_object(o).borrow().prototype;
        if current == proto {
            return Ok(());
        }
        if !self.get_object(o).borrow().extensible {
            return Err(JsError::type_error("Cannot set prototype of a non-extensible object"));
        }
        let mut cursor = proto;
        while let Some(p) = cursor {
            if p == o {
                return Err(JsError::type_error("Cyclic __proto__ value"));
            }
            cursor = self.get_object(p).borrow().prototype;
        }
        self.get_object(o).borrow_mut().prototype = proto;
        Ok(())
    }

    /// Makes every own property non-configurable, and data properties read-only too when `freeze`.
    fn integrity_lock(&mut self, o: JsObject, freeze: bool) -> JsResult<()> {
        for key in self.own_property_keys(o) {
            let Some(current) = self.get_own_property(o, &key) else {
                continue;
            };
            let mut desc = PropertyDescriptor {
                configurable: Some(false),
                ..Default::default()
            };
            if freeze && current.is_data_descriptor() {
                desc.writable = Some(false);
            }
            self.define_own_property(o, &key, desc, true)?;
        }
        self.get_object(o).borrow_mut().extensible = false;
        Ok(())
    }

    fn test_integrity(&self, o: JsObject, frozen: bool) -> bool {
        if self.get_object(o).borrow().extensible {
            return false;
        }
        self.own_property_keys(o).iter().all(|key| {
            self.get_own_property(o, key).is_none_or(|d| {
                !d.configurable() && !(frozen && d.is_data_descriptor() && d.writable())
            })
        })
    }

    pub(crate) fn setup_object(&mut self) {
        let proto = self.realm.object_prototype;
        let ctor = self.native_constructor(
            "Object",
            1,
            Rc::new(|interp, _this, args| match arg(args, 0) {
                JsValue::Undefined | JsValue::Null => Ok(JsValue::Object(interp.create_object())),
                v => Ok(JsValue::Object(interp.to_object(&v)?)),
            }),
            Rc::new(|interp, args| match arg(args, 0) {
                JsValue::Undefined | JsValue::Null => Ok(JsValue::Object(interp.create_object())),
                v => Ok(JsValue::Object(interp.to_object(&v)?)),
            }),
            proto,
        );

        let statics: Methods = vec![
            (
                "getPrototypeOf",
                1,
                Rc::new(|interp, _this, args| {
                    let o = require_object(&arg(args, 0), "getPrototypeOf")?;
                    Ok(interp
                        .get_object(o)
                        .borrow()
                        .prototype
                        .map_or(JsValue::Null, JsValue::Object))
                }),
            ),
            (
                "setPrototypeOf",
                2,
                Rc::new(|interp, _this, args| {
                    let target = arg(args, 0);
                    if target.is_nullish() {
                        return Err(JsError::type_error("Object.setPrototypeOf called on null or undefined"));
                    }
                    let proto = match arg(args, 1) {
                        JsValue::Object(p) => Some(p),
                        JsValue::Null => None,
                        other => {
                            return Err(JsError::type_error(format!(
                                "Object prototype may only be an Object or null: {}",
                                primitive_to_string(&other)
                            )));
                        }
                    };
                    if let JsValue::Object(o) = target {
                        interp.set_prototype(o, proto)?;
                    }
                    Ok(target)
                }),
            ),
            (
                "getOwnPropertyDescriptor",
                2,
                Rc::new(|interp, _this, args| {
                    let o = require_object(&arg(args, 0), "getOwnPropertyDescriptor")?;
                    let key = interp.to_property_key(&arg(args, 1))?;
                    let desc = interp.get_own_property(o, &key);
                    Ok(interp.from_property_descriptor(desc))
                }),
            ),
            (
                "getOwnPropertyNames",
                1,
                Rc::new(|interp, _this, args| {
                    let o = require_object(&arg(args, 0), "getOwnPropertyNames")?;
                    let names = interp
                        .own_property_keys(o)
                        .into_iter()
                        .map(|k| JsValue::from_str(&k))
                        .collect();
                    Ok(JsValue::Object(interp.create_array(names)))
                }),
            ),
            (
                "keys",
                1,
                Rc::new(|interp, _this, args| {
                    let o = require_object(&arg(args, 0), "keys")?;
                    let names = interp
                        .own_property_keys(o)
                        .into_iter()
                        .filter(|k| interp.get_own_property(o, k).is_some_and(|d| d.enumerable()))
                        .map(|k| JsValue::from_str(&k))
                        .collect();
                    Ok(JsValue::Object(interp.create_array(names)))
                }),
            ),
            (
                "create",
                2,
                Rc::new(|interp, _this, args| {
                    let proto = match arg(args, 0) {
                        JsValue::Object(p) => Some(p),
                        JsValue::Null => None,
                        other => {
                            return Err(JsError::type_error(format!(
                                "Object prototype may only be an Object or null: {}",
                                primitive_to_string(&other)
                            )));
                        }
                    };
                    let o = interp.alloc(JsObjectData::new(proto));
                    let properties = arg(args, 1);
                    if !properties.is_undefined() {
                        interp.define_properties(o, &properties)?;
                    }
                    Ok(JsValue::Object(o))
                }),
            ),
            (
                "defineProperty",
                3,
                Rc::new(|interp, _this, args| {
                    let o = require_object(&arg(args, 0), "defineProperty")?;
                    let key = interp.to_property_key(&arg(args, 1))?;
                    let desc = interp.to_property_descriptor(&arg(args, 2))?;
                    interp.define_own_property(o, &key, desc, true)?;
                    Ok(JsValue::Object(o))
                }),
            ),
            (
                "defineProperties",
                2,
                Rc::new(|interp, _this, args| {
                    let o = require_object(&arg(args, 0), "defineProperties")?;
                    interp.define_properties(o, &arg(args, 1))?;
                    Ok(JsValue::Object(o))
                }),
            ),
            (
                "seal",
                1,
                Rc::new(|interp, _this, args| {
                    let o = require_object(&arg(args, 0), "seal")?;
                    interp.integrity_lock(o, false)?;
                    Ok(JsValue::Object(o))
                }),
            ),
            (
                "freeze",
                1,
                Rc::new(|interp, _this, args| {
                    let o = require_object(&arg(args, 0), "freeze")?;
                    interp.integrity_lock(o, true)?;
                    Ok(JsValue::Object(o))
                }),
            ),
            (
                "preventExtensions",
                1,
                Rc::new(|interp, _this, args| {
                    let o = require_object(&arg(args, 0), "preventExtensions")?;
                    interp.get_object(o).borrow_mut().extensible = false;
                    Ok(JsValue::Object(o))
                }),
            ),
            (
                "isSealed",
                1,
                Rc::new(|interp, _this, args| {
                    let o = require_object(&arg(args, 0), "isSealed")?;
                    Ok(JsValue::Boolean(interp.test_integrity(o, false)))
                }),
            ),
            (
                "isFrozen",
                1,
                Rc::new(|interp, _this, args| {
                    let o = require_object(&arg(args, 0), "isFrozen")?;
                    Ok(JsValue::Boolean(interp.test_integrity(o, true)))
                }),
            ),
            (
                "isExtensible",
                1,
                Rc::new(|interp, _this, args| {
                    let o = require_object(&arg(args, 0), "isExtensible")?;
                    Ok(JsValue::Boolean(interp.get_object(o).borrow().extensible))
                }),
            ),
        ];
        self.define_methods(ctor, statics);

        let methods: Methods = vec![
            (
                "toString",
                0,
                Rc::new(|interp, this, _args| {
                    let class = match this {
                        JsValue::Undefined => "Undefined",
                        JsValue::Null => "Null",
                        v => {
                            let o = interp.to_object(v)?;
                            interp.get_object(o).borrow().class_name
                        }
                    };
                    Ok(JsValue::from_str(&format!("[object {class}]")))
                }),
            ),
            (
                "toLocaleString",
                0,
                Rc::new(|interp, this, _args| {
                    let o = interp.to_object(this)?;
                    let to_string = interp.get(o, "toString")?;
                    if !interp.is_callable(&to_string) {
                        return Err(JsError::type_error("toString is not a function"));
                    }
                    interp.call(&to_string, this.clone(), &[])
                }),
            ),
            (
                "valueOf",
                0,
                Rc::new(|interp, this, _args| Ok(JsValue::Object(interp.to_object(this)?))),
            ),
            (
                "hasOwnProperty",
                1,
                Rc::new(|interp, this, args| {
                    let key = interp.to_property_key(&arg(args, 0))?;
                    let o = interp.to_object(this)?;
                    Ok(JsValue::Boolean(interp.get_own_property(o, &key).is_some()))
                }),
            ),
            (
                "isPrototypeOf",
                1,
                Rc::new(|interp, this, args| {
                    let JsValue::Object(v) = arg(args, 0) else {
                        return Ok(JsValue::Boolean(false));
                    };
                    let o = interp.to_object(this)?;
                    let mut cursor = interp.get_object(v).borrow().prototype;
                    while let Some(p) = cursor {
                        if p == o {
                            return Ok(JsValue::Boolean(true));
                        }
                        cursor = interp.get_object(p).borrow().prototype;
                    }
                    Ok(JsValue::Boolean(false))
                }),
            ),
            (
                "propertyIsEnumerable",
                1,
                Rc::new(|interp, this, args| {
                    let key = interp.to_property_key(&arg(args, 0))?;
                    let o = interp.to_object(this)?;
                    let enumerable = interp.get_own_property(o, &key).is_some_and(|d| d.enumerable());
                    Ok(JsValue::Boolean(enumerable))
                }),
            ),
        ];
        self.define_methods(proto, methods);

        let getter = self.native_function(
            "get __proto__",
            0,
            Rc::new(|interp, this, _args| {
                let o = interp.to_object(this)?;
                Ok(interp
                    .get_object(o)
                    .borrow()
                    .prototype
                    .map_or(JsValue::Null, JsValue::Object))
            }),
        );
        let setter = self.native_function(
            "set __proto__",
            1,
            Rc::new(|interp, this, args| {
                if this.is_nullish() {
                    return Err(JsError::type_error(
                        "Object.prototype.__proto__ called on null or undefined",
                    ));
                }
                let proto = match arg(args, 0) {
                    JsValue::Object(p) => Some(p),
                    JsValue::Null => None,
                    _ => return Ok(JsValue::Undefined),
                };
                if let JsValue::Object(o) = this {
                    interp.set_prototype(*o, proto)?;
                }
                Ok(JsValue::Undefined)
            }),
        );
        self.get_object(proto).borrow_mut().insert_property(
            "__proto__".to_string(),
            PropertyDescriptor::accessor(JsValue::Object(getter), JsValue::Object(setter), false, true),
        );
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
    fn descriptor_round_trip() {
        assert_eq!(
            run("var o = {}; Object.defineProperty(o, 'x', {value: 1}); var d = Object.getOwnPropertyDescriptor(o, 'x'); [d.value, d.writable, d.enumerable, d.configurable].join()"),
            "1,false,false,false"
        );
        assert_eq!(
            run("var d = Object.getOwnPropertyDescriptor({get a() { return 1; }}, 'a'); typeof d.get + typeof d.set + d.enumerable"),
            "functionundefinedtrue"
        );
        assert_eq!(run("Object.getOwnPropertyDescriptor({}, 'missing')"), "undefined");
        assert_eq!(
            run("var g = function () {}, s = function (v) {}; var o = {}; Object.defineProperty(o, 'p', {get: g, set: s, configurable: true}); var d = Object.getOwnPropertyDescriptor(o, 'p'); [d.get === g, d.set === s, d.enumerable, d.configurable].join()"),
            "true,true,false,true"
        );
    }

    #[test]
    fn mixed_descriptors_are_rejected() {
        assert_eq!(
            run("Object.defineProperty({}, 'x', {value: 1, get: function () {}})"),
            "Uncaught TypeError: Invalid property descriptor. Cannot both specify accessors and a value or writable attribute"
        );
        assert!(run("Object.defineProperty({}, 'x', {get: 5})").starts_with("Uncaught TypeError: Getter must be a function"));
    }

    #[test]
    fn redefining_locked_property_throws() {
        assert!(
            run("var o = {}; Object.defineProperty(o, 'x', {value: 1}); Object.defineProperty(o, 'x', {value: 2})")
                .starts_with("Uncaught TypeError")
        );
        assert_eq!(
            run("var o = {}; Object.defineProperty(o, 'x', {value: 1}); Object.defineProperty(o, 'x', {value: 1}); o.x"),
            "1"
        );
    }

    #[test]
    fn freeze_and_seal() {
        assert_eq!(
            run("var o = Object.freeze({a: 1}); o.a = 2; o.b = 3; [o.a, o.b, Object.isFrozen(o), Object.isSealed(o)].join()"),
            "1,,true,true"
        );
        assert_eq!(
            run("var o = Object.seal({a: 1}); o.a = 2; delete o.a; [o.a, Object.isFrozen(o), Object.isSealed(o)].join()"),
            "2,false,true"
        );
        assert_eq!(run("Object.isFrozen(Object.preventExtensions({}))"), "true");
        assert_eq!(
            run("'use strict'; var o = Object.freeze({a: 1}); try { o.a = 2; } catch (e) { e.name }"),
            "TypeError"
        );
    }

    #[test]
    fn create_keys_and_names() {
        assert_eq!(
            run("var o = Object.create({p: 1}, {x: {value: 2, enumerable: true}, y: {value: 3}}); [o.p, Object.keys(o), Object.getOwnPropertyNames(o)].join('|')"),
            "1|x|x,y"
        );
        assert_eq!(run("Object.getPrototypeOf(Object.create(null))"), "null");
        assert_eq!(run("Object.getOwnPropertyNames('ab').join()"), "Uncaught TypeError: Object.getOwnPropertyNames called on non-object ab");
    }

    #[test]
    fn proto_accessor() {
        assert_eq!(
            run("var parent = {}; var child = {}; child.__proto__ = parent; parent.x = 1; var a = child.x; child.x = 2; [a, parent.x, child.x].join()"),
            "1,1,2"
        );
        assert!(run("var a = {}; var b = Object.create(a); a.__proto__ = b").starts_with("Uncaught TypeError: Cyclic"));
        assert_eq!(run("var o = {}; o.__proto__ = 5; Object.getPrototypeOf(o) === Object.prototype"), "true");
    }

    #[test]
    fn prototype_methods() {
        assert_eq!(run("Object.prototype.toString.call([])"), "[object Array]");
        assert_eq!(run("Object.prototype.toString.call(null)"), "[object Null]");
        assert_eq!(run("Object.prototype.toString.call(1)"), "[object Number]");
        assert_eq!(run("({a: 1}).hasOwnProperty('a') && !({}).hasOwnProperty('toString')"), "true");
        assert_eq!(run("Object.prototype.isPrototypeOf([])"), "true");
        assert_eq!(run("[1].propertyIsEnumerable(0) && ![1].propertyIsEnumerable('length')"), "true");
        assert_eq!(run("var o = new Object(5); typeof o + o.valueOf()"), "object5");
    }
}
