use super::*;

#[derive(Debug, Clone)]
pub enum ReferenceBase {
    Unresolvable,
    /// An object, or a primitive that is wrapped on access.
    Value(JsValue),
    Environment(EnvRef),
}

/// A resolved name, consumed right away by `get_value` or `put_value`.
#[derive(Debug, Clone)]
pub struct Reference {
    pub base: ReferenceBase,
    pub name: String,
    pub strict: bool,
}

impl Reference {
    pub fn new(base: ReferenceBase, name: &str, strict: bool) -> Self {
        Self {
            base,
            name: name.to_string(),
            strict,
        }
    }

    pub fn is_unresolvable(&self) -> bool {
        matches!(self.base, ReferenceBase::Unresolvable)
    }
}

impl Interpreter {
    pub(crate) fn get_value(&mut self, reference: &Reference) -> JsResult<JsValue> {
        match &reference.base {
            ReferenceBase::Unresolvable => Err(JsError::reference_error(format!(
                "{} is not defined",
                reference.name
            ))),
            ReferenceBase::Value(JsValue::Object(o)) => self.get(*o, &reference.name),
            ReferenceBase::Value(primitive) => {
                let wrapper = self.to_object(primitive)?;
                self.get_with_receiver(wrapper, &reference.name, primitive)
            }
            ReferenceBase::Environment(env) => {
                self.get_binding_value(env, &reference.name, reference.strict)
            }
        }
    }

    pub(crate) fn put_value(&mut self, reference: &Reference, value: JsValue) -> JsResult<()> {
        match &reference.base {
            ReferenceBase::Unresolvable => {
                if reference.strict {
                    return Err(JsError::reference_error(format!(
                        "{} is not defined",
                        reference.name
                    )));
                }
                let global = self.realm.global_object;
                self.put(global, &reference.name, value, false)
            }
            ReferenceBase::Value(JsValue::Object(o)) => {
                self.put(*o, &reference.name, value, reference.strict)
            }
            ReferenceBase::Value(primitive) => {
                self.put_on_primitive(primitive, &reference.name, value, reference.strict)
            }
            ReferenceBase::Environment(env) => {
                self.set_mutable_binding(env, &reference.name, value, reference.strict)
            }
        }
    }

    /// `[[Put]]` with a primitive base: the wrapper is temporary, so only
    /// inherited setters have an observable effect.
    fn put_on_primitive(
        &mut self,
        base: &JsValue,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> JsResult<()> {
        let wrapper = self.to_object(base)?;
        let fail = |message: String| if strict { Err(JsError::type_error(message)) } else { Ok(()) };
        if !self.can_put(wrapper, name) {
            return fail(format!("Cannot assign to read only property '{name}'"));
        }
        if let Some(own) = self.get_own_property(wrapper, name)
            && own.is_data_descriptor()
        {
            return fail(format!("Cannot assign to property '{name}' of a primitive value"));
        }
        if let Some(desc) = self.get_property(wrapper, name)
            && desc.is_accessor_descriptor()
        {
            if let Some(setter) = desc.setter().cloned() {
                self.call(&setter, base.clone(), &[value])?;
            }
            return Ok(());
        }
        fail(format!("Cannot create property '{name}' on a primitive value"))
    }
}
