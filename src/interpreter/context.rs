use super::*;
use log::trace;

/// Outcome of executing a statement.
#[derive(Debug, Clone)]
pub enum Completion {
    Normal(Option<JsValue>),
    /// Target label, then the value of the statements run before the jump.
    Break(Option<String>, Option<JsValue>),
    Continue(Option<String>, Option<JsValue>),
    Return(JsValue),
    Throw(JsValue),
}

impl Completion {
    pub fn empty() -> Self {
        Completion::Normal(None)
    }

    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    /// The value carried by a normal, break or continue completion.
    pub fn value(&self) -> Option<JsValue> {
        match self {
            Completion::Normal(v) | Completion::Break(_, v) | Completion::Continue(_, v) => v.clone(),
            Completion::Return(_) | Completion::Throw(_) => None,
        }
    }

    /// Replaces an empty completion value with `value`, for statement lists.
    pub fn or_value(self, value: Option<JsValue>) -> Self {
        match self {
            Completion::Normal(None) => Completion::Normal(value),
            Completion::Break(label, None) => Completion::Break(label, value),
            Completion::Continue(label, None) => Completion::Continue(label, value),
            other => other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub variable_env: EnvRef,
    pub lexical_env: EnvRef,
    pub this_binding: JsValue,
    pub strict: bool,
    /// Labels of the labelled statements enclosing the one being executed.
    pub label_set: Vec<String>,
}

impl ExecutionContext {
    pub fn new(env: EnvRef, this_binding: JsValue, strict: bool) -> Self {
        Self {
            variable_env: env.clone(),
            lexical_env: env,
            this_binding,
            strict,
            label_set: Vec::new(),
        }
    }
}

impl Interpreter {
    /// The running execution context.
    pub(crate) fn context(&self) -> &ExecutionContext {
        self.contexts.last().unwrap_or(&self.global_context)
    }

    pub(crate) fn context_mut(&mut self) -> &mut ExecutionContext {
        match self.contexts.last_mut() {
            Some(ctx) => ctx,
            None => &mut self.global_context,
        }
    }

    pub(crate) fn push_context(&mut self, ctx: ExecutionContext) {
        trace!(
            "push context depth={} strict={}",
            self.contexts.len() + 1,
            ctx.strict
        );
        self.contexts.push(ctx);
    }

    pub(crate) fn pop_context(&mut self) {
        self.contexts.pop();
        trace!("pop context depth={}", self.contexts.len());
    }

    pub(crate) fn lexical_env(&self) -> EnvRef {
        self.context().lexical_env.clone()
    }

    pub(crate) fn is_strict(&self) -> bool {
        self.context().strict
    }

    /// Runs `f` with the lexical environment temporarily replaced by `env`.
    pub(crate) fn with_lexical_env<T>(&mut self, env: EnvRef, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.context_mut().lexical_env, env);
        let result = f(self);
        self.context_mut().lexical_env = saved;
        result
    }
}
