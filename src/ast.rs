//! Syntax tree built by the parser and walked by the interpreter.

use std::rc::Rc;

/// Global or eval code.
#[derive(Clone, Debug)]
pub struct Program {
    pub body: Rc<FunctionBody>,
}

/// Code of a program or function together with the declarations hoisted out of it.
#[derive(Clone, Debug, Default)]
pub struct FunctionBody {
    pub strict: bool,
    pub statements: Vec<Statement>,
    /// Top-level function declarations, in source order.
    pub function_declarations: Vec<Rc<FunctionDefinition>>,
    /// `var` names from any depth short of a nested function, first occurrence wins.
    pub var_names: Vec<String>,
    pub source: Rc<str>,
}

#[derive(Clone, Debug)]
pub struct FunctionDefinition {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<FunctionBody>,
    /// Source from the `function` keyword (or accessor name) through the closing brace.
    pub source_text: String,
    /// A declaration nested in a block, bound when control reaches it.
    pub in_block: bool,
}

#[derive(Clone, Debug)]
pub enum Statement {
    Block(Vec<Statement>),
    Variable(Vec<VariableDeclarator>),
    Empty,
    Expression(Expression),
    If(IfStatement),
    DoWhile(DoWhileStatement),
    While(WhileStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    Continue(Option<String>),
    Break(Option<String>),
    Return(Option<Expression>),
    With(Expression, Box<Statement>),
    Switch(SwitchStatement),
    Labeled(String, Box<Statement>),
    Throw(Expression),
    Try(TryStatement),
    Debugger,
    FunctionDeclaration(Rc<FunctionDefinition>),
}

#[derive(Clone, Debug)]
pub struct VariableDeclarator {
    pub name: String,
    pub init: Option<Expression>,
}

#[derive(Clone, Debug)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
}

#[derive(Clone, Debug)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub test: Expression,
}

#[derive(Clone, Debug)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub enum ForInit {
    Variable(Vec<VariableDeclarator>),
    Expression(Expression),
}

#[derive(Clone, Debug)]
pub struct ForInStatement {
    pub left: ForInTarget,
    pub right: Expression,
    pub body: Box<Statement>,
}

/// What a `for-in` loop assigns each enumerated key to.
#[derive(Clone, Debug)]
pub enum ForInTarget {
    Variable(VariableDeclarator),
    Expression(Expression),
}

#[derive(Clone, Debug)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
}

/// A `case` clause, or the `default` clause when `test` is `None`.
#[derive(Clone, Debug)]
pub struct SwitchCase {
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub struct TryStatement {
    pub block: Vec<Statement>,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Vec<Statement>>,
}

#[derive(Clone, Debug)]
pub struct CatchClause {
    pub param: String,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub enum Expression {
    This,
    Identifier(String),
    Literal(Literal),
    Array(Vec<Option<Expression>>),
    Object(Vec<Property>),
    Function(Rc<FunctionDefinition>),
    Member(Box<Expression>, MemberKey),
    New(Box<Expression>, Vec<Expression>),
    Call(Box<Expression>, Vec<Expression>),
    Update(UpdateOp, Box<Expression>),
    Unary(UnaryOp, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Logical(LogicalOp, Box<Expression>, Box<Expression>),
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
    /// Plain `=` carries no operator; `+=` and friends carry the one they apply.
    Assign(Option<BinaryOp>, Box<Expression>, Box<Expression>),
    Comma(Vec<Expression>),
}

impl Expression {
    /// Left-hand sides the grammar accepts for assignment, update and `for-in`.
    /// Calls pass the early check and fail with a ReferenceError when evaluated.
    pub fn is_valid_simple_target(&self) -> bool {
        matches!(
            self,
            Expression::Identifier(_) | Expression::Member(..) | Expression::Call(..)
        )
    }
}

/// The part of a property accessor after the object.
#[derive(Clone, Debug)]
pub enum MemberKey {
    /// `object.name`
    Name(String),
    /// `object[expression]`
    Computed(Box<Expression>),
}

#[derive(Clone, Debug)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(Vec<u16>),
    RegExp { pattern: String, flags: String },
}

#[derive(Clone, Debug)]
pub struct Property {
    pub key: String,
    pub value: PropertyValue,
}

#[derive(Clone, Debug)]
pub enum PropertyValue {
    Data(Expression),
    Get(Rc<FunctionDefinition>),
    Set(Rc<FunctionDefinition>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UpdateOp {
    pub fn is_prefix(self) -> bool {
        matches!(self, UpdateOp::PreIncrement | UpdateOp::PreDecrement)
    }

    pub fn delta(self) -> f64 {
        match self {
            UpdateOp::PreIncrement | UpdateOp::PostIncrement => 1.0,
            UpdateOp::PreDecrement | UpdateOp::PostDecrement => -1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Delete,
    Void,
    Typeof,
    Plus,
    Minus,
    BitNot,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    LShift,
    RShift,
    URShift,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Instanceof,
    In,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    BitAnd,
    BitXor,
    BitOr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}
