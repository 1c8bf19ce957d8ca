use super::*;

pub type EnvRef = Rc<RefCell<Environment>>;

/// One link of the scope chain: a record plus the environment enclosing it.
#[derive(Debug)]
pub struct Environment {
    pub record: EnvironmentRecord,
    pub outer: Option<EnvRef>,
}

#[derive(Debug)]
pub enum EnvironmentRecord {
    Declarative(FxHashMap<String, Binding>),
    /// Bindings are the properties of `object`; `provide_this` is set for `with`.
    Object { object: JsObject, provide_this: bool },
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub value: JsValue,
    pub mutable: bool,
    pub deletable: bool,
    pub initialized: bool,
}

impl Environment {
    pub fn new_declarative(outer: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            record: EnvironmentRecord::Declarative(FxHashMap::default()),
            outer,
        }))
    }

    pub fn new_object(object: JsObject, outer: Option<EnvRef>, provide_this: bool) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            record: EnvironmentRecord::Object {
                object,
                provide_this,
            },
            outer,
        }))
    }

    /// Reads a declarative binding without any strictness checks; used by mapped
    /// arguments objects whose parameters always exist.
    pub fn binding_value(&self, name: &str) -> JsValue {
        match &self.record {
            EnvironmentRecord::Declarative(bindings) => bindings
                .get(name)
                .map(|b| b.value.clone())
                .unwrap_or(JsValue::Undefined),
            EnvironmentRecord::Object { .. } => JsValue::Undefined,
        }
    }

    /// Overwrites a declarative binding's value regardless of mutability.
    pub fn set_binding_value(&mut self, name: &str, value: JsValue) {
        if let EnvironmentRecord::Declarative(bindings) = &mut self.record
            && let Some(binding) = bindings.get_mut(name)
        {
            binding.value = value;
            binding.initialized = true;
        }
    }

    /// Values held directly by a declarative record, for the collector.
    pub fn trace(&self, out: &mut Vec<JsObject>) {
        match &self.record {
            EnvironmentRecord::Declarative(bindings) => {
                for b in bindings.values() {
                    if let JsValue::Object(o) = &b.value {
                        out.push(*o);
                    }
                }
            }
            EnvironmentRecord::Object { object, .. } => out.push(*object),
        }
    }
}

impl Interpreter {
    pub(crate) fn has_binding(&self, env: &EnvRef, name: &str) -> bool {
        match &env.borrow().record {
            EnvironmentRecord::Declarative(bindings) => bindings.contains_key(name),
            EnvironmentRecord::Object { object, .. } => self.has_property(*object, name),
        }
    }

    pub(crate) fn create_mutable_binding(
        &mut self,
        env: &EnvRef,
        name: &str,
        deletable: bool,
    ) -> JsResult<()> {
        let object = match &mut env.borrow_mut().record {
            EnvironmentRecord::Declarative(bindings) => {
                bindings.insert(
                    name.to_string(),
                    Binding {
                        value: JsValue::Undefined,
                        mutable: true,
                        deletable,
                        initialized: true,
                    },
                );
                return Ok(());
            }
            EnvironmentRecord::Object { object, .. } => *object,
        };
        self.define_own_property(
            object,
            name,
            PropertyDescriptor::data(JsValue::Undefined, true, true, deletable),
            true,
        )?;
        Ok(())
    }

    pub(crate) fn create_immutable_binding(&mut self, env: &EnvRef, name: &str) {
        if let EnvironmentRecord::Declarative(bindings) = &mut env.borrow_mut().record {
            bindings.insert(
                name.to_string(),
                Binding {
                    value: JsValue::Undefined,
                    mutable: false,
                    deletable: false,
                    initialized: false,
                },
            );
        }
    }

    pub(crate) fn initialize_immutable_binding(&mut self, env: &EnvRef, name: &str, value: JsValue) {
        env.borrow_mut().set_binding_value(name, value);
    }

    pub(crate) fn set_mutable_binding(
        &mut self,
        env: &EnvRef,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> JsResult<()> {
        let object = match &mut env.borrow_mut().record {
            EnvironmentRecord::Declarative(bindings) => {
                return match bindings.get_mut(name) {
                    Some(binding) if binding.mutable => {
                        binding.value = value;
                        Ok(())
                    }
                    Some(_) if strict => Err(JsError::type_error(format!(
                        "Assignment to constant variable '{name}'"
                    ))),
                    Some(_) => Ok(()),
                    None => Err(JsError::reference_error(format!("{name} is not defined"))),
                };
            }
            EnvironmentRecord::Object { object, .. } => *object,
        };
        self.put(object, name, value, strict)
    }

    pub(crate) fn get_binding_value(
        &mut self,
        env: &EnvRef,
        name: &str,
        strict: bool,
    ) -> JsResult<JsValue> {
        let object = match &env.borrow().record {
            EnvironmentRecord::Declarative(bindings) => {
                return match bindings.get(name) {
                    Some(binding) if !binding.initialized => {
                        if strict {
                            Err(JsError::reference_error(format!(
                                "{name} is not initialized"
                            )))
                        } else {
                            Ok(JsValue::Undefined)
                        }
                    }
                    Some(binding) => Ok(binding.value.clone()),
                    None => Err(JsError::reference_error(format!("{name} is not defined"))),
                };
            }
            EnvironmentRecord::Object { object, .. } => *object,
        };
        if !self.has_property(object, name) {
            if strict {
                return Err(JsError::reference_error(format!("{name} is not defined")));
            }
            return Ok(JsValue::Undefined);
        }
        self.get(object, name)
    }

    pub(crate) fn delete_binding(&mut self, env: &EnvRef, name: &str) -> JsResult<bool> {
        let object = match &mut env.borrow_mut().record {
            EnvironmentRecord::Declarative(bindings) => {
                return Ok(match bindings.get(name) {
                    None => true,
                    Some(binding) if binding.deletable => {
                        bindings.remove(name);
                        true
                    }
                    Some(_) => false,
                });
            }
            EnvironmentRecord::Object { object, .. } => *object,
        };
        self.delete(object, name, false)
    }

    pub(crate) fn implicit_this_value(&self, env: &EnvRef) -> JsValue {
        match &env.borrow().record {
            EnvironmentRecord::Object {
                object,
                provide_this: true,
            } => JsValue::Object(*object),
            _ => JsValue::Undefined,
        }
    }

    /// Walks the scope chain outward from `env` looking for `name`.
    pub(crate) fn get_identifier_reference(
        &self,
        env: Option<EnvRef>,
        name: &str,
        strict: bool,
    ) -> Reference {
        let mut current = env;
        while let Some(e) = current {
            if self.has_binding(&e, name) {
                return Reference::new(ReferenceBase::Environment(e), name, strict);
            }
            current = e.borrow().outer.clone();
        }
        Reference::new(ReferenceBase::Unresolvable, name, strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarative_bindings() {
        let mut interp = Interpreter::new();
        let env = Environment::new_declarative(None);
        assert!(!interp.has_binding(&env, "x"));
        interp.create_mutable_binding(&env, "x", false).unwrap();
        assert!(interp.has_binding(&env, "x"));
        interp
            .set_mutable_binding(&env, "x", JsValue::Number(3.0), true)
            .unwrap();
        let v = interp.get_binding_value(&env, "x", true).unwrap();
        assert!(matches!(v, JsValue::Number(n) if n == 3.0));
        assert!(!interp.delete_binding(&env, "x").unwrap());
    }

    #[test]
    fn immutable_binding_rejects_strict_writes() {
        let mut interp = Interpreter::new();
        let env = Environment::new_declarative(None);
        interp.create_immutable_binding(&env, "f");
        assert!(matches!(
            interp.get_binding_value(&env, "f", false),
            Ok(JsValue::Undefined)
        ));
        interp.initialize_immutable_binding(&env, "f", JsValue::Boolean(true));
        assert!(
            interp
                .set_mutable_binding(&env, "f", JsValue::Null, false)
                .is_ok()
        );
        assert!(
            interp
                .set_mutable_binding(&env, "f", JsValue::Null, true)
                .is_err()
        );
        assert!(matches!(
            interp.get_binding_value(&env, "f", true),
            Ok(JsValue::Boolean(true))
        ));
    }

    #[test]
    fn object_record_delegates_to_properties() {
        let mut interp = Interpreter::new();
        let obj = interp.create_object();
        let env = Environment::new_object(obj, None, true);
        interp.create_mutable_binding(&env, "y", true).unwrap();
        interp
            .set_mutable_binding(&env, "y", JsValue::from_str("v"), false)
            .unwrap();
        assert!(interp.get_own_property(obj, "y").is_some());
        assert!(matches!(interp.implicit_this_value(&env), JsValue::Object(o) if o == obj));
        assert!(interp.delete_binding(&env, "y").unwrap());
        assert!(!interp.has_binding(&env, "y"));
    }

    #[test]
    fn identifier_resolution_walks_outward() {
        let mut interp = Interpreter::new();
        let outer = Environment::new_declarative(None);
        interp.create_mutable_binding(&outer, "a", false).unwrap();
        let inner = Environment::new_declarative(Some(outer.clone()));
        let r = interp.get_identifier_reference(Some(inner), "a", false);
        assert!(matches!(&r.base, ReferenceBase::Environment(e) if Rc::ptr_eq(e, &outer)));
        let r = interp.get_identifier_reference(Some(outer), "missing", false);
        assert!(r.is_unresolvable());
    }
}
