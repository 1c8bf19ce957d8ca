use crate::types::JsValue;

/// A property's attribute set. Each field is `None` when absent, which gives the
/// partial descriptors `Object.defineProperty` works with. Descriptors stored on
/// objects are always complete.
#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptor {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    pub get: Option<JsValue>,
    pub set: Option<JsValue>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: Some(value),
            writable: Some(writable),
            get: None,
            set: None,
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    pub fn data_default(value: JsValue) -> Self {
        Self::data(value, true, true, true)
    }

    /// Writable, configurable, not enumerable: the shape of builtin methods.
    pub fn builtin(value: JsValue) -> Self {
        Self::data(value, true, false, true)
    }

    pub fn accessor(get: JsValue, set: JsValue, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: None,
            writable: None,
            get: Some(get),
            set: Some(set),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_data_descriptor() && !self.is_accessor_descriptor()
    }

    /// No fields present at all.
    pub fn is_empty(&self) -> bool {
        self.is_generic_descriptor() && self.enumerable.is_none() && self.configurable.is_none()
    }

    pub fn writable(&self) -> bool {
        self.writable.unwrap_or(false)
    }

    pub fn enumerable(&self) -> bool {
        self.enumerable.unwrap_or(false)
    }

    pub fn configurable(&self) -> bool {
        self.configurable.unwrap_or(false)
    }

    /// The stored value of a data property, `undefined` when absent.
    pub fn value_or_undefined(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }

    /// The getter function of an accessor, if it has one.
    pub fn getter(&self) -> Option<&JsValue> {
        self.get.as_ref().filter(|g| !g.is_undefined())
    }

    /// The setter function of an accessor, if it has one.
    pub fn setter(&self) -> Option<&JsValue> {
        self.set.as_ref().filter(|s| !s.is_undefined())
    }

    /// Fills absent fields with their defaults so the descriptor can be stored.
    pub fn completed(mut self) -> Self {
        if self.is_generic_descriptor() || self.is_data_descriptor() {
            self.value.get_or_insert(JsValue::Undefined);
            self.writable.get_or_insert(false);
        } else {
            self.get.get_or_insert(JsValue::Undefined);
            self.set.get_or_insert(JsValue::Undefined);
        }
        self.enumerable.get_or_insert(false);
        self.configurable.get_or_insert(false);
        self
    }
}
