use super::builtins::regexp::RegExpData;
use super::descriptor::PropertyDescriptor;
use super::environment::EnvRef;
use super::error::JsResult;
use crate::ast::FunctionDefinition;
use crate::types::{JsObject, JsString, JsValue};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::rc::Rc;

pub type NativeFn = Rc<dyn Fn(&mut super::Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue>>;
pub type NativeConstructFn = Rc<dyn Fn(&mut super::Interpreter, &[JsValue]) -> JsResult<JsValue>>;

#[derive(Clone)]
pub enum JsFunction {
    User {
        def: Rc<FunctionDefinition>,
        closure: EnvRef,
        strict: bool,
    },
    Native {
        name: String,
        arity: usize,
        call: NativeFn,
        construct: Option<NativeConstructFn>,
    },
    Bound {
        target: JsObject,
        bound_this: JsValue,
        bound_args: Vec<JsValue>,
    },
}

impl JsFunction {
    pub fn native(
        name: &str,
        arity: usize,
        f: impl Fn(&mut super::Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue> + 'static,
    ) -> Self {
        JsFunction::Native {
            name: name.to_string(),
            arity,
            call: Rc::new(f),
            construct: None,
        }
    }
}

impl std::fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsFunction::User { def, .. } => write!(f, "JsFunction::User({:?})", def.name),
            JsFunction::Native { name, arity, .. } => {
                write!(f, "JsFunction::Native({name:?}, {arity})")
            }
            JsFunction::Bound { target, .. } => write!(f, "JsFunction::Bound({})", target.id),
        }
    }
}

/// Live link between an arguments object's indices and the parameters of its call.
#[derive(Debug, Clone)]
pub struct ArgumentsMap {
    pub env: EnvRef,
    /// Property name of a still-mapped index to its parameter name.
    pub mapped: FxHashMap<String, String>,
}

/// Capability tag selecting the internal-method specializations of an object.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Ordinary,
    Array,
    Function(JsFunction),
    Arguments(ArgumentsMap),
    StringWrapper(JsString),
    Boolean(bool),
    Number(f64),
    Error,
    Date(f64),
    RegExp(Rc<RegExpData>),
}

#[derive(Debug)]
pub struct JsObjectData {
    pub properties: IndexMap<String, PropertyDescriptor>,
    pub prototype: Option<JsObject>,
    pub extensible: bool,
    pub class_name: &'static str,
    pub kind: ObjectKind,
}

impl JsObjectData {
    pub fn new(prototype: Option<JsObject>) -> Self {
        Self {
            properties: IndexMap::new(),
            prototype,
            extensible: true,
            class_name: "Object",
            kind: ObjectKind::Ordinary,
        }
    }

    pub fn with_kind(prototype: Option<JsObject>, class_name: &'static str, kind: ObjectKind) -> Self {
        Self {
            class_name,
            kind,
            ..Self::new(prototype)
        }
    }

    pub fn callable(&self) -> Option<&JsFunction> {
        match &self.kind {
            ObjectKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array)
    }

    pub fn get_property_value(&self, key: &str) -> Option<JsValue> {
        self.properties.get(key).and_then(|d| d.value.clone())
    }

    pub fn insert_property(&mut self, key: String, desc: PropertyDescriptor) {
        self.properties.insert(key, desc);
    }

    pub fn insert_value(&mut self, key: String, value: JsValue) {
        self.properties
            .insert(key, PropertyDescriptor::data_default(value));
    }

    pub fn insert_builtin(&mut self, key: String, value: JsValue) {
        self.properties
            .insert(key, PropertyDescriptor::builtin(value));
    }

    /// Every object handle this object keeps alive.
    pub fn trace(&self, out: &mut Vec<JsObject>) {
        fn push(v: &JsValue, out: &mut Vec<JsObject>) {
            if let JsValue::Object(o) = v {
                out.push(*o);
            }
        }
        if let Some(p) = self.prototype {
            out.push(p);
        }
        for desc in self.properties.values() {
            for v in [&desc.value, &desc.get, &desc.set].into_iter().flatten() {
                push(v, out);
            }
        }
        if let ObjectKind::Function(JsFunction::Bound {
            target,
            bound_this,
            bound_args,
        }) = &self.kind
        {
            out.push(*target);
            push(bound_this, out);
            for a in bound_args {
                push(a, out);
            }
        }
    }

    /// Environments captured by this object (closures and mapped arguments).
    pub fn captured_env(&self) -> Option<&EnvRef> {
        match &self.kind {
            ObjectKind::Function(JsFunction::User { closure, .. }) => Some(closure),
            ObjectKind::Arguments(map) => Some(&map.env),
            _ => None,
        }
    }
}
