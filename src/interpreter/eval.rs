use super::*;

impl Interpreter {
    pub(crate) fn identifier_reference(&self, name: &str) -> Reference {
        self.get_identifier_reference(Some(self.lexical_env()), name, self.is_strict())
    }

    pub(crate) fn eval_expression(&mut self, expr: &Expression) -> JsResult<JsValue> {
        match expr {
            Expression::Literal(lit) => self.eval_literal(lit),
            Expression::Identifier(name) => {
                let reference = self.identifier_reference(name);
                self.get_value(&reference)
            }
            Expression::This => Ok(self.context().this_binding.clone()),
            Expression::Array(elements) => self.eval_array_literal(elements),
            Expression::Object(props) => self.eval_object_literal(props),
            Expression::Function(def) => {
                Ok(JsValue::Object(self.instantiate_function_expression(def)))
            }
            Expression::Unary(UnaryOp::Delete, arg) => self.eval_delete(arg).map(JsValue::Boolean),
            Expression::Unary(UnaryOp::Typeof, arg) => {
                if let Expression::Identifier(name) = arg.as_ref()
                    && self.identifier_reference(name).is_unresolvable()
                {
                    return Ok(JsValue::from_str("undefined"));
                }
                let v = self.eval_expression(arg)?;
                Ok(JsValue::from_str(self.type_of(&v)))
            }
            Expression::Unary(op, arg) => {
                let v = self.eval_expression(arg)?;
                self.apply_unary(*op, &v)
            }
            Expression::Binary(op, left, right) => {
                let l = self.eval_expression(left)?;
                let r = self.eval_expression(right)?;
                self.apply_binary(*op, &l, &r)
            }
            Expression::Logical(op, left, right) => {
                let l = self.eval_expression(left)?;
                match (op, to_boolean(&l)) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(l),
                    _ => self.eval_expression(right),
                }
            }
            Expression::Update(op, target) => {
                let reference = self.eval_target(target)?;
                let old = self.get_value(&reference)?;
                let old = self.to_number(&old)?;
                let new = old + op.delta();
                self.put_value(&reference, JsValue::Number(new))?;
                Ok(JsValue::Number(if op.is_prefix() { new } else { old }))
            }
            Expression::Assign(op, target, value) => {
                let reference = self.eval_target(target)?;
                let result = match *op {
                    None => self.eval_expression(value)?,
                    Some(binary) => {
                        let l = self.get_value(&reference)?;
                        let r = self.eval_expression(value)?;
                        self.apply_binary(binary, &l, &r)?
                    }
                };
                self.put_value(&reference, result.clone())?;
                Ok(result)
            }
            Expression::Conditional(test, consequent, alternate) => {
                let test = self.eval_expression(test)?;
                if to_boolean(&test) {
                    self.eval_expression(consequent)
                } else {
                    self.eval_expression(alternate)
                }
            }
            Expression::Call(callee, args) => self.eval_call(callee, args),
            Expression::New(callee, args) => {
                let constructor = self.eval_expression(callee)?;
                let args = self.eval_arguments(args)?;
                if !self.is_callable(&constructor) {
                    return Err(JsError::type_error(format!(
                        "{} is not a constructor",
                        describe_callee(callee)
                    )));
                }
                self.construct(&constructor, &args)
            }
            Expression::Member(object, key) => {
                let reference = self.eval_member_reference(object, key)?;
                self.get_value(&reference)
            }
            Expression::Comma(exprs) => {
                let mut last = JsValue::Undefined;
                for e in exprs {
                    last = self.eval_expression(e)?;
                }
                Ok(last)
            }
        }
    }

    /// Evaluates an expression used as an assignment target.
    pub(crate) fn eval_target(&mut self, expr: &Expression) -> JsResult<Reference> {
        match expr {
            Expression::Identifier(name) => Ok(self.identifier_reference(name)),
            Expression::Member(object, key) => self.eval_member_reference(object, key),
            other => {
                self.eval_expression(other)?;
                Err(JsError::reference_error("Invalid left-hand side in assignment"))
            }
        }
    }

    fn eval_member_reference(
        &mut self,
        object: &Expression,
        key: &MemberKey,
    ) -> JsResult<Reference> {
        let base = self.eval_expression(object)?;
        let key = match key {
            MemberKey::Name(name) => {
                check_object_coercible(&base, name)?;
                name.clone()
            }
            MemberKey::Computed(e) => {
                let key = self.eval_expression(e)?;
                if base.is_nullish() {
                    let shown = match &key {
                        JsValue::Object(_) => "[object]".to_string(),
                        primitive => primitive_to_string(primitive).to_rust_string(),
                    };
                    check_object_coercible(&base, &shown)?;
                }
                self.to_property_key(&key)?
            }
        };
        Ok(Reference::new(ReferenceBase::Value(base), &key, self.is_strict()))
    }

    fn eval_literal(&mut self, lit: &Literal) -> JsResult<JsValue> {
        Ok(match lit {
            Literal::Null => JsValue::Null,
            Literal::Boolean(b) => JsValue::Boolean(*b),
            Literal::Number(n) => JsValue::Number(*n),
            Literal::String(units) => JsValue::String(JsString::from_units(units.clone())),
            Literal::RegExp { pattern, flags } => JsValue::Object(self.create_regexp(pattern, flags)?),
        })
    }

    fn eval_array_literal(&mut self, elements: &[Option<Expression>]) -> JsResult<JsValue> {
        let mut data = JsObjectData::with_kind(Some(self.realm.array_prototype), "Array", ObjectKind::Array);
        for (i, element) in elements.iter().enumerate() {
            if let Some(e) = element {
                let v = self.eval_expression(e)?;
                data.insert_value(i.to_string(), v);
            }
        }
        data.insert_property(
            "length".to_string(),
            PropertyDescriptor::data(JsValue::Number(elements.len() as f64), true, false, false),
        );
        Ok(JsValue::Object(self.alloc(data)))
    }

    fn eval_object_literal(&mut self, props: &[Property]) -> JsResult<JsValue> {
        let obj = self.create_object();
        for prop in props {
            let desc = match &prop.value {
                PropertyValue::Data(value) => PropertyDescriptor::data_default(self.eval_expression(value)?),
                PropertyValue::Get(def) => PropertyDescriptor {
                    get: Some(JsValue::Object(self.instantiate_function(def, self.lexical_env()))),
                    enumerable: Some(true),
                    configurable: Some(true),
                    ..Default::default()
                },
                PropertyValue::Set(def) => PropertyDescriptor {
                    set: Some(JsValue::Object(self.instantiate_function(def, self.lexical_env()))),
                    enumerable: Some(true),
                    configurable: Some(true),
                    ..Default::default()
                },
            };
            self.define_own_property(obj, &prop.key, desc, false)?;
        }
        Ok(JsValue::Object(obj))
    }

    fn eval_arguments(&mut self, args: &[Expression]) -> JsResult<Vec<JsValue>> {
        args.iter().map(|a| self.eval_expression(a)).collect()
    }

    fn eval_call(&mut self, callee: &Expression, args: &[Expression]) -> JsResult<JsValue> {
        let (func, this) = match callee {
            Expression::Identifier(_) | Expression::Member(_, _) => {
                let reference = self.eval_target(callee)?;
                let func = self.get_value(&reference)?;
                let this = match &reference.base {
                    ReferenceBase::Value(base) => base.clone(),
                    ReferenceBase::Environment(env) => self.implicit_this_value(env),
                    ReferenceBase::Unresolvable => JsValue::Undefined,
                };
                (func, this)
            }
            other => (self.eval_expression(other)?, JsValue::Undefined),
        };
        let args = self.eval_arguments(args)?;
        if !self.is_callable(&func) {
            return Err(JsError::type_error(format!(
                "{} is not a function",
                describe_callee(callee)
            )));
        }
        if let Expression::Identifier(name) = callee
            && name == "eval"
            && func.as_object() == Some(self.realm.eval_function)
        {
            return self.direct_eval(&args);
        }
        self.call(&func, this, &args)
    }

    fn eval_delete(&mut self, arg: &Expression) -> JsResult<bool> {
        match arg {
            Expression::Identifier(name) => {
                let reference = self.identifier_reference(name);
                match &reference.base {
                    ReferenceBase::Environment(env) => self.delete_binding(env, name),
                    _ => Ok(true),
                }
            }
            Expression::Member(object, key) => {
                let reference = self.eval_member_reference(object, key)?;
                let ReferenceBase::Value(base) = &reference.base else {
                    return Ok(true);
                };
                let o = self.to_object(base)?;
                self.delete(o, &reference.name, reference.strict)
            }
            other => {
                self.eval_expression(other)?;
                Ok(true)
            }
        }
    }

    /// Operators applied to an already evaluated operand. `delete` and `typeof`
    /// of a bare identifier are handled on the reference before this.
    pub(crate) fn apply_unary(&mut self, op: UnaryOp, v: &JsValue) -> JsResult<JsValue> {
        Ok(match op {
            UnaryOp::Minus => JsValue::Number(-self.to_number(v)?),
            UnaryOp::Plus => JsValue::Number(self.to_number(v)?),
            UnaryOp::Not => JsValue::Boolean(!to_boolean(v)),
            UnaryOp::BitNot => JsValue::Number(f64::from(!self.to_int32(v)?)),
            UnaryOp::Typeof => JsValue::from_str(self.type_of(v)),
            UnaryOp::Void => JsValue::Undefined,
            UnaryOp::Delete => JsValue::Boolean(true),
        })
    }

    pub(crate) fn apply_binary(&mut self, op: BinaryOp, l: &JsValue, r: &JsValue) -> JsResult<JsValue> {
        let numeric = |this: &mut Self, f: fn(f64, f64) -> f64| -> JsResult<JsValue> {
            let a = this.to_number(l)?;
            let b = this.to_number(r)?;
            Ok(JsValue::Number(f(a, b)))
        };
        Ok(match op {
            BinaryOp::Add => {
                let lp = self.to_primitive(l, None)?;
                let rp = self.to_primitive(r, None)?;
                if lp.is_string() || rp.is_string() {
                    let ls = primitive_to_string(&lp);
                    let rs = primitive_to_string(&rp);
                    JsValue::String(ls.concat(&rs))
                } else {
                    JsValue::Number(self.to_number(&lp)? + self.to_number(&rp)?)
                }
            }
            BinaryOp::Sub => return numeric(self, |a, b| a - b),
            BinaryOp::Mul => return numeric(self, |a, b| a * b),
            BinaryOp::Div => return numeric(self, |a, b| a / b),
            BinaryOp::Mod => return numeric(self, |a, b| a % b),
            BinaryOp::LShift => {
                let (a, b) = (self.to_int32(l)?, self.to_uint32(r)?);
                JsValue::Number(f64::from(a.wrapping_shl(b & 0x1F)))
            }
            BinaryOp::RShift => {
                let (a, b) = (self.to_int32(l)?, self.to_uint32(r)?);
                JsValue::Number(f64::from(a >> (b & 0x1F)))
            }
            BinaryOp::URShift => {
                let (a, b) = (self.to_uint32(l)?, self.to_uint32(r)?);
                JsValue::Number(f64::from(a >> (b & 0x1F)))
            }
            BinaryOp::BitAnd => JsValue::Number(f64::from(self.to_int32(l)? & self.to_int32(r)?)),
            BinaryOp::BitOr => JsValue::Number(f64::from(self.to_int32(l)? | self.to_int32(r)?)),
            BinaryOp::BitXor => JsValue::Number(f64::from(self.to_int32(l)? ^ self.to_int32(r)?)),
            BinaryOp::Eq => JsValue::Boolean(self.abstract_equals(l, r)?),
            BinaryOp::NotEq => JsValue::Boolean(!self.abstract_equals(l, r)?),
            BinaryOp::StrictEq => JsValue::Boolean(strict_equals(l, r)),
            BinaryOp::StrictNotEq => JsValue::Boolean(!strict_equals(l, r)),
            BinaryOp::Lt => {
                JsValue::Boolean(self.abstract_relational_comparison(l, r, true)? == Some(true))
            }
            BinaryOp::Gt => {
                JsValue::Boolean(self.abstract_relational_comparison(r, l, false)? == Some(true))
            }
            BinaryOp::LtEq => {
                JsValue::Boolean(self.abstract_relational_comparison(r, l, false)? == Some(false))
            }
            BinaryOp::GtEq => {
                JsValue::Boolean(self.abstract_relational_comparison(l, r, true)? == Some(false))
            }
            BinaryOp::In => {
                let JsValue::Object(o) = r else {
                    return Err(JsError::type_error(format!(
                        "Cannot use 'in' operator to search for '{l}' in {r}"
                    )));
                };
                let key = self.to_property_key(l)?;
                JsValue::Boolean(self.has_property(*o, &key))
            }
            BinaryOp::Instanceof => {
                let JsValue::Object(o) = r else {
                    return Err(JsError::type_error(
                        "Right-hand side of 'instanceof' is not callable",
                    ));
                };
                JsValue::Boolean(self.has_instance(*o, l)?)
            }
        })
    }
}

fn check_object_coercible(base: &JsValue, key: &str) -> JsResult<()> {
    if base.is_nullish() {
        return Err(JsError::type_error(format!(
            "Cannot read property '{key}' of {base}"
        )));
    }
    Ok(())
}

/// Source-like rendering of a callee for "is not a function" messages.
pub(crate) fn describe_callee(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(name) => name.clone(),
        Expression::This => "this".to_string(),
        Expression::Member(object, MemberKey::Name(name)) => {
            format!("{}.{name}", describe_callee(object))
        }
        Expression::Member(object, MemberKey::Computed(_)) => {
            format!("{}[...]", describe_callee(object))
        }
        Expression::Call(callee, _) => format!("{}(...)", describe_callee(callee)),
        _ => "expression".to_string(),
    }
}
