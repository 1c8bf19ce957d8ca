use crate::ast::*;
use crate::error::EngineError;
use crate::parser;
use crate::types::{JsObject, JsString, JsValue, number_ops};
use log::{debug, warn};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

mod builtins;
mod context;
mod conversion;
mod declaration;
mod descriptor;
mod environment;
mod error;
mod eval;
mod exec;
mod function;
mod heap;
mod object;
mod property;
mod reference;

pub use context::{Completion, ExecutionContext};
pub(crate) use conversion::{
    Hint, is_str_whitespace, primitive_to_string, same_value, strict_equals, to_boolean,
};
pub use descriptor::PropertyDescriptor;
pub use environment::{EnvRef, Environment};
pub use error::{ErrorKind, JsError, JsResult};
use heap::{Slot, push_slot};
pub use object::{ArgumentsMap, JsFunction, JsObjectData, NativeConstructFn, NativeFn, ObjectKind};
pub use reference::{Reference, ReferenceBase};

/// Array slots rendered by `display_value` before the rest is summarized.
const DISPLAY_ARRAY_ITEMS: usize = 100;

/// Host-tunable engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Treat global code as strict mode code.
    pub strict: bool,
    /// Allocations between two garbage collections.
    pub gc_threshold: usize,
    /// Buffer `console.log` output instead of printing it.
    pub capture_output: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict: false,
            gc_threshold: 4096,
            capture_output: false,
        }
    }
}

/// Objects the engine itself refers to, allocated before any script runs.
#[derive(Debug, Clone)]
pub(crate) struct Intrinsics {
    pub object_prototype: JsObject,
    pub function_prototype: JsObject,
    pub array_prototype: JsObject,
    pub string_prototype: JsObject,
    pub boolean_prototype: JsObject,
    pub number_prototype: JsObject,
    pub date_prototype: JsObject,
    pub regexp_prototype: JsObject,
    pub error_prototype: JsObject,
    pub eval_error_prototype: JsObject,
    pub range_error_prototype: JsObject,
    pub reference_error_prototype: JsObject,
    pub syntax_error_prototype: JsObject,
    pub type_error_prototype: JsObject,
    pub uri_error_prototype: JsObject,
    pub global_object: JsObject,
    pub eval_function: JsObject,
    pub throw_type_error: JsObject,
}

impl Intrinsics {
    fn allocate(objects: &mut Vec<Slot>) -> Self {
        let object_prototype = push_slot(objects, JsObjectData::new(None));
        let base = Some(object_prototype);
        let with_length = |mut data: JsObjectData| {
            data.insert_property(
                "length".to_string(),
                PropertyDescriptor::data(JsValue::Number(0.0), true, false, false),
            );
            data
        };
        let function_prototype = push_slot(
            objects,
            JsObjectData::with_kind(
                base,
                "Function",
                ObjectKind::Function(JsFunction::native("", 0, |_, _, _| Ok(JsValue::Undefined))),
            ),
        );
        let array_prototype = push_slot(
            objects,
            with_length(JsObjectData::with_kind(base, "Array", ObjectKind::Array)),
        );
        let mut string_data = JsObjectData::with_kind(
            base,
            "String",
            ObjectKind::StringWrapper(JsString::default()),
        );
        string_data.insert_property(
            "length".to_string(),
            PropertyDescriptor::data(JsValue::Number(0.0), false, false, false),
        );
        let string_prototype = push_slot(objects, string_data);
        let boolean_prototype = push_slot(
            objects,
            JsObjectData::with_kind(base, "Boolean", ObjectKind::Boolean(false)),
        );
        let number_prototype = push_slot(
            objects,
            JsObjectData::with_kind(base, "Number", ObjectKind::Number(0.0)),
        );
        let date_prototype = push_slot(
            objects,
            JsObjectData::with_kind(base, "Date", ObjectKind::Date(f64::NAN)),
        );
        let regexp_prototype = push_slot(objects, JsObjectData::new(base));
        let error_prototype = push_slot(
            objects,
            JsObjectData::with_kind(base, "Error", ObjectKind::Error),
        );
        let mut native_error =
            || push_slot(objects, JsObjectData::with_kind(Some(error_prototype), "Error", ObjectKind::Error));
        let eval_error_prototype = native_error();
        let range_error_prototype = native_error();
        let reference_error_prototype = native_error();
        let syntax_error_prototype = native_error();
        let type_error_prototype = native_error();
        let uri_error_prototype = native_error();
        let global_object = push_slot(
            objects,
            JsObjectData::with_kind(base, "global", ObjectKind::Ordinary),
        );
        let eval_function = push_slot(
            objects,
            JsObjectData::with_kind(
                Some(function_prototype),
                "Function",
                ObjectKind::Function(JsFunction::native("eval", 1, builtins::global::indirect_eval)),
            ),
        );
        let mut thrower = JsObjectData::with_kind(
            Some(function_prototype),
            "Function",
            ObjectKind::Function(JsFunction::native("ThrowTypeError", 0, |_, _, _| {
                Err(JsError::type_error(
                    "'caller', 'callee', and 'arguments' properties may not be accessed on strict mode functions or the arguments objects for calls to them",
                ))
            })),
        );
        thrower.extensible = false;
        let throw_type_error = push_slot(objects, thrower);

        Self {
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            boolean_prototype,
            number_prototype,
            date_prototype,
            regexp_prototype,
            error_prototype,
            eval_error_prototype,
            range_error_prototype,
            reference_error_prototype,
            syntax_error_prototype,
            type_error_prototype,
            uri_error_prototype,
            global_object,
            eval_function,
            throw_type_error,
        }
    }

    pub(crate) fn roots(&self) -> Vec<JsObject> {
        vec![
            self.object_prototype,
            self.function_prototype,
            self.array_prototype,
            self.string_prototype,
            self.boolean_prototype,
            self.number_prototype,
            self.date_prototype,
            self.regexp_prototype,
            self.error_prototype,
            self.eval_error_prototype,
            self.range_error_prototype,
            self.reference_error_prototype,
            self.syntax_error_prototype,
            self.type_error_prototype,
            self.uri_error_prototype,
            self.global_object,
            self.eval_function,
            self.throw_type_error,
        ]
    }

    pub(crate) fn error_prototype_for(&self, kind: ErrorKind) -> JsObject {
        match kind {
            ErrorKind::Eval => self.eval_error_prototype,
            ErrorKind::Range => self.range_error_prototype,
            ErrorKind::Reference => self.reference_error_prototype,
            ErrorKind::Syntax => self.syntax_error_prototype,
            ErrorKind::Type => self.type_error_prototype,
            ErrorKind::Uri => self.uri_error_prototype,
            ErrorKind::Native => self.error_prototype,
        }
    }
}

pub struct Interpreter {
    objects: Vec<Slot>,
    free_list: Vec<usize>,
    pub(crate) realm: Intrinsics,
    global_env: EnvRef,
    global_context: ExecutionContext,
    contexts: Vec<ExecutionContext>,
    config: EngineConfig,
    allocations_since_gc: usize,
    output: Vec<String>,
    rng_state: u64,
    /// Stand-in returned for handles whose slot has been reclaimed.
    detached: Rc<RefCell<JsObjectData>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let mut objects = Vec::new();
        let realm = Intrinsics::allocate(&mut objects);
        let global_env = Environment::new_object(realm.global_object, None, false);
        let global_context = ExecutionContext::new(
            global_env.clone(),
            JsValue::Object(realm.global_object),
            config.strict,
        );
        let mut detached = JsObjectData::new(None);
        detached.extensible = false;
        let seed = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or(0x2545_f491_4f6c_dd1d) as u64;
        let mut interp = Self {
            objects,
            free_list: Vec::new(),
            realm,
            global_env,
            global_context,
            contexts: Vec::new(),
            config,
            allocations_since_gc: 0,
            output: Vec::new(),
            rng_state: seed | 1,
            detached: Rc::new(RefCell::new(detached)),
        };
        interp.setup_globals();
        interp
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parses and runs `source` as global code, returning its completion value.
    pub fn evaluate(&mut self, source: &str) -> Result<JsValue, EngineError> {
        self.maybe_collect_garbage();
        let program = parser::parse_program(source, self.config.strict)?;
        let body = program.body;
        debug!(
            "running program: {} statements, strict={}",
            body.statements.len(),
            body.strict
        );
        let ctx = ExecutionContext::new(
            self.global_env.clone(),
            JsValue::Object(self.realm.global_object),
            body.strict,
        );
        self.push_context(ctx);
        let completion = match self.instantiate_global_declarations(&body, false) {
            Ok(()) => self.exec_statements(&body.statements),
            Err(err) => Completion::Throw(self.error_to_value(err)),
        };
        self.pop_context();
        debug!("program finished: {}", if completion.is_abrupt() { "abrupt" } else { "normal" });
        match completion {
            Completion::Normal(v) => Ok(v.unwrap_or(JsValue::Undefined)),
            Completion::Return(v) => Ok(v),
            Completion::Throw(v) => Err(self.uncaught(v)),
            Completion::Break(_, v) | Completion::Continue(_, v) => Ok(v.unwrap_or(JsValue::Undefined)),
        }
    }

    /// ToString of `v`, with a throwing conversion reported as uncaught.
    pub fn value_to_string(&mut self, v: &JsValue) -> Result<String, EngineError> {
        match self.to_string(v) {
            Ok(s) => Ok(s.to_rust_string()),
            Err(err) => {
                let thrown = self.error_to_value(err);
                Err(self.uncaught(thrown))
            }
        }
    }

    fn uncaught(&mut self, v: JsValue) -> EngineError {
        let (name, message) = match &v {
            JsValue::Object(o) if matches!(self.get_object(*o).borrow().kind, ObjectKind::Error) => {
                let name = self.get(*o, "name").unwrap_or(JsValue::Undefined);
                let message = self.get(*o, "message").unwrap_or(JsValue::Undefined);
                let name = if name.is_undefined() {
                    "Error".to_string()
                } else {
                    self.display_value(&name)
                };
                let message = if message.is_undefined() {
                    String::new()
                } else {
                    self.display_value(&message)
                };
                (name, message)
            }
            other => {
                let message = match self.to_string(other) {
                    Ok(s) => s.to_rust_string(),
                    Err(_) => self.display_value(other),
                };
                (String::new(), message)
            }
        };
        warn!("uncaught exception: {name} {message}");
        EngineError::Uncaught { name, message }
    }

    /// Everything `console.log` buffered since the last call, one line per call.
    pub fn take_output(&mut self) -> String {
        let lines = std::mem::take(&mut self.output);
        lines.join("\n")
    }

    pub(crate) fn write_line(&mut self, line: String) {
        if self.config.capture_output {
            self.output.push(line);
        } else {
            println!("{line}");
        }
    }

    /// Host rendering of a value: strings raw, objects in a REPL-like form.
    pub fn display_value(&self, v: &JsValue) -> String {
        self.display_nested(v, 0)
    }

    fn display_nested(&self, v: &JsValue, depth: usize) -> String {
        let JsValue::Object(o) = v else {
            return v.to_string();
        };
        let data = self.get_object(*o);
        let data = data.borrow();
        let quoted = |value: &JsValue| match value {
            JsValue::String(s) => format!("'{s}'"),
            other => self.display_nested(other, depth + 1),
        };
        match &data.kind {
            ObjectKind::Function(JsFunction::User { def, .. }) => {
                format!("[Function: {}]", def.name.as_deref().unwrap_or("anonymous"))
            }
            ObjectKind::Function(JsFunction::Native { name, .. }) => format!("[Function: {name}]"),
            ObjectKind::Function(JsFunction::Bound { .. }) => "[Function: bound]".to_string(),
            ObjectKind::Error => {
                let field = |key: &str| {
                    data.get_property_value(key)
                        .or_else(|| {
                            data.prototype.and_then(|p| self.lookup_plain(p, key))
                        })
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                };
                let name = field("name");
                let message = field("message");
                if message.is_empty() { name } else { format!("{name}: {message}") }
            }
            ObjectKind::StringWrapper(s) => format!("[String: '{s}']"),
            ObjectKind::Number(n) => format!("[Number: {}]", number_ops::to_string(*n)),
            ObjectKind::Boolean(b) => format!("[Boolean: {b}]"),
            ObjectKind::Date(t) => format!("[Date: {}]", number_ops::to_string(*t)),
            ObjectKind::RegExp(re) => re.to_string(),
            ObjectKind::Array if depth > 2 => "[Array]".to_string(),
            ObjectKind::Array => {
                let len = match data.get_property_value("length") {
                    Some(JsValue::Number(n)) => n as usize,
                    _ => 0,
                };
                let shown = len.min(DISPLAY_ARRAY_ITEMS);
                let mut items: Vec<String> = (0..shown)
                    .map(|i| {
                        data.get_property_value(&i.to_string())
                            .map(|v| quoted(&v))
                            .unwrap_or_default()
                    })
                    .collect();
                if len > shown {
                    items.push(format!("... {} more items", len - shown));
                }
                format!("[{}]", items.join(", "))
            }
            _ if depth > 2 => "[Object]".to_string(),
            _ => {
                let items: Vec<String> = data
                    .properties
                    .iter()
                    .filter(|(_, d)| d.enumerable())
                    .map(|(k, d)| match &d.value {
                        Some(v) => format!("{k}: {}", quoted(v)),
                        None => format!("{k}: [Getter/Setter]"),
                    })
                    .collect();
                if items.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {} }}", items.join(", "))
                }
            }
        }
    }

    /// Data property lookup along the prototype chain without running getters.
    fn lookup_plain(&self, o: JsObject, key: &str) -> Option<JsValue> {
        self.get_property(o, key).and_then(|d| d.value)
    }
}
