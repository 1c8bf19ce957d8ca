use super::*;
use log::debug;
use rustc_hash::FxHashSet;

pub(crate) type Slot = Option<Rc<RefCell<JsObjectData>>>;

/// Appends `data` as a new slot; used before the interpreter exists.
pub(crate) fn push_slot(objects: &mut Vec<Slot>, data: JsObjectData) -> JsObject {
    let id = objects.len() as u64;
    objects.push(Some(Rc::new(RefCell::new(data))));
    JsObject { id }
}

impl Interpreter {
    pub(crate) fn alloc(&mut self, data: JsObjectData) -> JsObject {
        self.allocations_since_gc += 1;
        let slot = Some(Rc::new(RefCell::new(data)));
        if let Some(idx) = self.free_list.pop() {
            self.objects[idx] = slot;
            return JsObject { id: idx as u64 };
        }
        self.objects.push(slot);
        JsObject {
            id: (self.objects.len() - 1) as u64,
        }
    }

    /// The object behind a handle. A handle whose slot was reclaimed resolves
    /// to an inert, non-extensible object.
    pub(crate) fn get_object(&self, o: JsObject) -> Rc<RefCell<JsObjectData>> {
        match self.objects.get(o.id as usize) {
            Some(Some(rc)) => rc.clone(),
            _ => self.detached.clone(),
        }
    }

    pub(crate) fn create_object(&mut self) -> JsObject {
        self.alloc(JsObjectData::new(Some(self.realm.object_prototype)))
    }

    pub(crate) fn create_array(&mut self, values: Vec<JsValue>) -> JsObject {
        let mut data = JsObjectData::with_kind(Some(self.realm.array_prototype), "Array", ObjectKind::Array);
        let length = values.len() as f64;
        for (i, v) in values.into_iter().enumerate() {
            data.insert_value(i.to_string(), v);
        }
        data.insert_property(
            "length".to_string(),
            PropertyDescriptor::data(JsValue::Number(length), true, false, false),
        );
        self.alloc(data)
    }

    pub(crate) fn create_function_object(&mut self, f: JsFunction) -> JsObject {
        self.alloc(JsObjectData::with_kind(
            Some(self.realm.function_prototype),
            "Function",
            ObjectKind::Function(f),
        ))
    }

    /// Collects once enough allocations happened, but only between top-level
    /// runs: handles held on the Rust stack mid-evaluation are not roots.
    pub(crate) fn maybe_collect_garbage(&mut self) {
        if self.contexts.is_empty() && self.allocations_since_gc >= self.config.gc_threshold {
            self.collect_garbage();
        }
    }

    pub fn collect_garbage(&mut self) {
        if !self.contexts.is_empty() {
            return;
        }
        self.allocations_since_gc = 0;
        let before = self.live_objects();

        let mut marks = vec![false; self.objects.len()];
        let mut seen_envs: FxHashSet<*const RefCell<Environment>> = FxHashSet::default();
        let mut worklist: Vec<JsObject> = self.realm.roots();
        let mut env_worklist: Vec<EnvRef> = vec![self.global_env.clone()];
        for ctx in std::iter::once(&self.global_context).chain(self.contexts.iter()) {
            env_worklist.push(ctx.variable_env.clone());
            env_worklist.push(ctx.lexical_env.clone());
            if let JsValue::Object(o) = &ctx.this_binding {
                worklist.push(*o);
            }
        }

        loop {
            while let Some(env) = env_worklist.pop() {
                if !seen_envs.insert(Rc::as_ptr(&env)) {
                    continue;
                }
                let env = env.borrow();
                env.trace(&mut worklist);
                if let Some(outer) = &env.outer {
                    env_worklist.push(outer.clone());
                }
            }
            let Some(o) = worklist.pop() else {
                break;
            };
            let idx = o.id as usize;
            if idx >= marks.len() || marks[idx] {
                continue;
            }
            marks[idx] = true;
            let Some(Some(rc)) = self.objects.get(idx) else {
                continue;
            };
            let data = rc.borrow();
            data.trace(&mut worklist);
            if let Some(env) = data.captured_env() {
                env_worklist.push(env.clone());
            }
        }

        for (idx, marked) in marks.into_iter().enumerate() {
            if !marked && self.objects[idx].is_some() {
                self.objects[idx] = None;
                self.free_list.push(idx);
            }
        }
        debug!(
            "gc: {} objects before, {} after",
            before,
            self.live_objects()
        );
    }

    pub(crate) fn live_objects(&self) -> usize {
        self.objects.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_objects_are_reclaimed() {
        let mut interp = Interpreter::new();
        interp.collect_garbage();
        let baseline = interp.live_objects();
        let garbage = interp.create_object();
        let kept = interp.create_object();
        let global = interp.realm.global_object;
        interp.put(global, "kept", JsValue::Object(kept), true).unwrap();
        assert_eq!(interp.live_objects(), baseline + 2);
        interp.collect_garbage();
        assert_eq!(interp.live_objects(), baseline + 1);
        assert!(interp.get_own_property(garbage, "x").is_none());
        assert!(interp.get_object(kept).borrow().extensible);
    }

    #[test]
    fn reclaimed_slots_are_reused() {
        let mut interp = Interpreter::new();
        let first = interp.create_object();
        interp.collect_garbage();
        let second = interp.create_object();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn closures_keep_their_environment_alive() {
        let mut interp = Interpreter::new();
        interp
            .evaluate("var f = (function(){ var o = {v: 7}; return function(){ return o.v; }; })();")
            .unwrap();
        interp.collect_garbage();
        let v = interp.evaluate("f()").unwrap();
        assert!(matches!(v, JsValue::Number(n) if n == 7.0));
    }
}
