//! Selection expressions.
//!
//! A [`Selection`] describes what a caller reads from a source entity, in
//! the shape of a lambda: named parameters and a body built from member
//! accesses, calls, nested lambdas and operators.

use ormql_proto::Value;

/// A node in a selection body.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectExpr {
    /// Reference to a lambda parameter.
    Parameter(String),
    /// Member access on a target expression.
    Member {
        /// Expression the member is read from.
        target: Box<SelectExpr>,
        /// Member name.
        member: String,
    },
    /// Literal value.
    Constant(Value),
    /// Object construction with named members.
    New(Vec<(String, SelectExpr)>),
    /// Method call with an optional receiver.
    Call {
        /// Receiver of an instance or extension call.
        receiver: Option<Box<SelectExpr>>,
        /// Method name.
        method: String,
        /// Arguments in order.
        args: Vec<SelectExpr>,
    },
    /// Nested lambda, typically an argument of a call.
    Lambda(Box<Selection>),
    /// Unary operator.
    Unary {
        /// Operator symbol.
        op: String,
        /// Operand.
        operand: Box<SelectExpr>,
    },
    /// Binary operator.
    Binary {
        /// Operator symbol.
        op: String,
        /// Left operand.
        left: Box<SelectExpr>,
        /// Right operand.
        right: Box<SelectExpr>,
    },
    /// Conditional expression.
    Conditional {
        /// Condition.
        test: Box<SelectExpr>,
        /// Value when the condition holds.
        if_true: Box<SelectExpr>,
        /// Value otherwise.
        if_false: Box<SelectExpr>,
    },
}

impl SelectExpr {
    /// Reference a parameter.
    pub fn param(name: impl Into<String>) -> Self {
        SelectExpr::Parameter(name.into())
    }

    /// Parameter followed by a dotted member chain, e.g. `path("e", "Parent.Name")`.
    pub fn path(parameter: impl Into<String>, dotted: &str) -> Self {
        dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .fold(Self::param(parameter), |expr, member| expr.member(member))
    }

    /// Literal value.
    pub fn constant(value: impl Into<Value>) -> Self {
        SelectExpr::Constant(value.into())
    }

    /// Read a member of this expression.
    pub fn member(self, member: impl Into<String>) -> Self {
        SelectExpr::Member {
            target: Box::new(self),
            member: member.into(),
        }
    }

    /// Call a method on this expression.
    pub fn call(self, method: impl Into<String>, args: Vec<SelectExpr>) -> Self {
        SelectExpr::Call {
            receiver: Some(Box::new(self)),
            method: method.into(),
            args,
        }
    }

    /// Call a free method.
    pub fn call_static(method: impl Into<String>, args: Vec<SelectExpr>) -> Self {
        SelectExpr::Call {
            receiver: None,
            method: method.into(),
            args,
        }
    }

    /// Nested single-parameter lambda.
    pub fn lambda(parameter: impl Into<String>, body: SelectExpr) -> Self {
        SelectExpr::Lambda(Box::new(Selection::new(parameter, body)))
    }

    /// Object construction.
    pub fn new_object<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = (S, SelectExpr)>,
        S: Into<String>,
    {
        SelectExpr::New(members.into_iter().map(|(n, e)| (n.into(), e)).collect())
    }

    /// Unary operator.
    pub fn unary(op: impl Into<String>, operand: SelectExpr) -> Self {
        SelectExpr::Unary {
            op: op.into(),
            operand: Box::new(operand),
        }
    }

    /// Binary operator.
    pub fn binary(op: impl Into<String>, left: SelectExpr, right: SelectExpr) -> Self {
        SelectExpr::Binary {
            op: op.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Conditional expression.
    pub fn conditional(test: SelectExpr, if_true: SelectExpr, if_false: SelectExpr) -> Self {
        SelectExpr::Conditional {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }
}

/// A selection lambda over a source entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Parameter names. Every parameter is bound to the source entity, or
    /// in a nested lambda to the source of the enclosing call.
    pub parameters: Vec<String>,
    /// Lambda body.
    pub body: SelectExpr,
}

impl Selection {
    /// Single-parameter selection.
    pub fn new(parameter: impl Into<String>, body: SelectExpr) -> Self {
        Self {
            parameters: vec![parameter.into()],
            body,
        }
    }

    /// Selection with several parameters, all bound to the source.
    pub fn with_parameters<I, S>(parameters: I, body: SelectExpr) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parameters: parameters.into_iter().map(Into::into).collect(),
            body,
        }
    }

    /// Selection reading a list of dotted paths from the source.
    pub fn of_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let members = paths
            .into_iter()
            .map(|p| (p.replace('.', "_"), SelectExpr::path("e", p)));
        Self::new("e", SelectExpr::new_object(members))
    }
}
