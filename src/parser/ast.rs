//! Abstract Syntax Tree definitions for the supported PHP subset

use crate::lexer::Span;

/// A complete PHP source file
#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// Statement types
#[derive(Debug, Clone)]
pub enum Statement {
    /// Expression statement: expr;
    Expression { expr: Expression, span: Span },

    /// Function declaration: function name(params): Type { body }
    Function {
        name: String,
        params: Vec<Parameter>,
        return_type: Option<String>,
        body: Block,
        span: Span,
    },

    /// If statement: if (cond) { } elseif (cond) { } else { }
    If {
        condition: Expression,
        then_block: Block,
        else_ifs: Vec<(Expression, Block)>,
        else_block: Option<Block>,
        span: Span,
    },

    /// While loop: while (cond) { }
    While {
        condition: Expression,
        body: Block,
        span: Span,
    },

    /// For loop: for (init; cond; step) { }
    For {
        init: Vec<Expression>,
        condition: Vec<Expression>,
        step: Vec<Expression>,
        body: Block,
        span: Span,
    },

    /// Foreach loop: foreach ($subject as [$key =>] $value) { }
    Foreach {
        subject: Expression,
        key: Option<Expression>,
        value: Expression,
        body: Block,
        span: Span,
    },

    /// Return statement: return [expr];
    Return {
        value: Option<Expression>,
        span: Span,
    },

    /// Echo statement: echo a, b;
    Echo { values: Vec<Expression>, span: Span },

    /// Declare statement: declare(strict_types=1);
    Declare {
        directives: Vec<(String, Expression)>,
        span: Span,
    },

    /// Block of statements
    Block(Block),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Expression { span, .. } => *span,
            Statement::Function { span, .. } => *span,
            Statement::If { span, .. } => *span,
            Statement::While { span, .. } => *span,
            Statement::For { span, .. } => *span,
            Statement::Foreach { span, .. } => *span,
            Statement::Return { span, .. } => *span,
            Statement::Echo { span, .. } => *span,
            Statement::Declare { span, .. } => *span,
            Statement::Block(block) => block.span,
        }
    }

    pub fn line(&self) -> usize {
        self.span().line
    }
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    /// Declared type hint, verbatim (`int`, `?string`, `int|float`)
    pub type_hint: Option<String>,
    pub default: Option<Expression>,
    pub variadic: bool,
    pub by_ref: bool,
    pub span: Span,
}

/// Block of statements
#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// Call argument: [name:] [...]expr
#[derive(Debug, Clone)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expression,
    pub unpack: bool,
    pub span: Span,
}

/// Array literal element: [key =>] value
#[derive(Debug, Clone)]
pub struct ArrayItem {
    pub key: Option<Expression>,
    pub value: Expression,
    pub span: Span,
}

/// Target of a function call
#[derive(Debug, Clone)]
pub enum Callee {
    /// Statically known function name: foo(...)
    Name(String),
    /// Computed target: $fn(...), ($a ?: $b)(...)
    Dynamic(Box<Expression>),
}

impl Callee {
    pub fn static_name(&self) -> Option<&str> {
        match self {
            Callee::Name(name) => Some(name),
            Callee::Dynamic(_) => None,
        }
    }
}

/// Expression types
#[derive(Debug, Clone)]
pub enum Expression {
    /// Variable reference: $name
    Variable { name: String, span: Span },

    /// Integer literal
    Int { value: i64, span: Span },

    /// Float literal
    Float { value: f64, span: Span },

    /// String literal
    String { value: String, span: Span },

    /// Double-quoted string with embedded variables: "hello $name"
    Interpolated { raw: String, span: Span },

    /// Array literal: [a, 'k' => b] or array(a, b)
    Array { items: Vec<ArrayItem>, span: Span },

    /// Constant fetch: true, null, PHP_EOL
    Constant { name: String, span: Span },

    /// Binary operation: a + b, a . b, a && b
    Binary {
        left: Box<Expression>,
        operator: BinaryOp,
        right: Box<Expression>,
        span: Span,
    },

    /// Unary operation: -a, !a
    Unary {
        operator: UnaryOp,
        operand: Box<Expression>,
        span: Span,
    },

    /// Type cast: (int) a
    Cast {
        target: String,
        value: Box<Expression>,
        span: Span,
    },

    /// Increment / decrement: ++$a, $a--
    IncDec {
        increment: bool,
        prefix: bool,
        operand: Box<Expression>,
        span: Span,
    },

    /// Ternary: cond ? a : b, or the short form cond ?: b
    Ternary {
        condition: Box<Expression>,
        then_branch: Option<Box<Expression>>,
        else_branch: Box<Expression>,
        span: Span,
    },

    /// Assignment: target = value
    Assign {
        target: Box<Expression>,
        value: Box<Expression>,
        span: Span,
    },

    /// Compound assignment: target op= value
    CompoundAssign {
        operator: BinaryOp,
        target: Box<Expression>,
        value: Box<Expression>,
        span: Span,
    },

    /// Function call: callee(args)
    Call {
        callee: Callee,
        arguments: Vec<Argument>,
        span: Span,
    },

    /// Method call: object->method(args)
    MethodCall {
        object: Box<Expression>,
        method: String,
        arguments: Vec<Argument>,
        span: Span,
    },

    /// Property access: object->property
    Property {
        object: Box<Expression>,
        property: String,
        span: Span,
    },

    /// Index access: base[index], or base[] when pushing
    Index {
        base: Box<Expression>,
        index: Option<Box<Expression>>,
        span: Span,
    },

    /// Object creation: new Class(args)
    New {
        class: String,
        arguments: Vec<Argument>,
        span: Span,
    },

    /// Anonymous function: function ($x) use ($y) { ... }, or fn ($x) => expr
    /// with the arrow body stored as a single return statement
    Closure {
        params: Vec<Parameter>,
        uses: Vec<String>,
        body: Block,
        span: Span,
    },

    /// Static method call: Class::method(args)
    StaticCall {
        class: String,
        method: String,
        arguments: Vec<Argument>,
        span: Span,
    },

    /// Static property access: Class::$property
    StaticProperty {
        class: String,
        property: String,
        span: Span,
    },

    /// Class constant access: Class::NAME, Class::class
    ClassConstant {
        class: String,
        name: String,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Variable { span, .. } => *span,
            Expression::Int { span, .. } => *span,
            Expression::Float { span, .. } => *span,
            Expression::String { span, .. } => *span,
            Expression::Interpolated { span, .. } => *span,
            Expression::Array { span, .. } => *span,
            Expression::Constant { span, .. } => *span,
            Expression::Binary { span, .. } => *span,
            Expression::Unary { span, .. } => *span,
            Expression::Cast { span, .. } => *span,
            Expression::IncDec { span, .. } => *span,
            Expression::Ternary { span, .. } => *span,
            Expression::Assign { span, .. } => *span,
            Expression::CompoundAssign { span, .. } => *span,
            Expression::Call { span, .. } => *span,
            Expression::MethodCall { span, .. } => *span,
            Expression::Property { span, .. } => *span,
            Expression::Index { span, .. } => *span,
            Expression::New { span, .. } => *span,
            Expression::Closure { span, .. } => *span,
            Expression::StaticCall { span, .. } => *span,
            Expression::StaticProperty { span, .. } => *span,
            Expression::ClassConstant { span, .. } => *span,
        }
    }

    /// 1-based source line of the node
    pub fn line(&self) -> usize {
        self.span().line
    }

    /// Immediate sub-expressions held directly by a field of this node, in
    /// source order. Lists (arguments, array items, bodies) are not children.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Variable { .. }
            | Expression::Int { .. }
            | Expression::Float { .. }
            | Expression::String { .. }
            | Expression::Interpolated { .. }
            | Expression::Array { .. }
            | Expression::Constant { .. }
            | Expression::New { .. }
            | Expression::Closure { .. }
            | Expression::StaticCall { .. }
            | Expression::StaticProperty { .. }
            | Expression::ClassConstant { .. } => Vec::new(),
            Expression::Binary { left, right, .. } => vec![&**left, &**right],
            Expression::Unary { operand, .. } => vec![&**operand],
            Expression::Cast { value, .. } => vec![&**value],
            Expression::IncDec { operand, .. } => vec![&**operand],
            Expression::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let mut children = vec![&**condition];
                if let Some(then_branch) = then_branch {
                    children.push(&**then_branch);
                }
                children.push(&**else_branch);
                children
            }
            Expression::Assign { target, value, .. }
            | Expression::CompoundAssign { target, value, .. } => vec![&**target, &**value],
            Expression::Call { callee, .. } => match callee {
                Callee::Name(_) => Vec::new(),
                Callee::Dynamic(target) => vec![&**target],
            },
            Expression::MethodCall { object, .. } => vec![&**object],
            Expression::Property { object, .. } => vec![&**object],
            Expression::Index { base, index, .. } => {
                let mut children = vec![&**base];
                if let Some(index) = index {
                    children.push(&**index);
                }
                children
            }
        }
    }

    /// Short human description used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Expression::Variable { .. } => "a variable",
            Expression::Index { .. } => "an array element",
            Expression::Property { .. } | Expression::StaticProperty { .. } => "a property",
            Expression::Array { .. } => "an array destructuring pattern",
            Expression::Call { .. }
            | Expression::MethodCall { .. }
            | Expression::StaticCall { .. } => "a call result",
            _ => "an expression",
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Concat,

    // Comparison
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Spaceship,

    // Logical
    And,
    Or,
    Coalesce,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "**",
            BinaryOp::Concat => ".",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Identical => "===",
            BinaryOp::NotIdentical => "!==",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Spaceship => "<=>",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Negate,
    Plus,
    Not,
}
