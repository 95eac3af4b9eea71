//! Declarative hyperparameter metadata.
//!
//! Every component of an estimator (the base options, the problem builder and
//! each regularizer) declares its hyperparameters along with a list of
//! constraints. A value is valid when it satisfies ANY of the constraints of
//! its list. The same metadata drives the algebraic attributes of the live
//! optimization parameters created for solver-parameterized hyperparameters.

use std::collections::HashSet;
use std::fmt;

use ndarray::{Array1, Array2};
use serde_json::Value;

use super::error::{EstimatorError, Result};
use crate::expressions::Sign;
use crate::Float;

/// A dynamically typed hyperparameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum HyperValue<F> {
    None,
    Bool(bool),
    Int(i64),
    Real(F),
    Str(String),
    Array(Array1<F>),
    Matrix(Array2<F>),
    /// Any JSON value, used for solver options.
    Mapping(Value),
}

impl<F: Float> HyperValue<F> {
    /// Numeric value of integers and floats.
    pub fn as_real(&self) -> Option<F> {
        match self {
            HyperValue::Int(i) => F::from_i64(*i),
            HyperValue::Real(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HyperValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl<F: Float> fmt::Display for HyperValue<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HyperValue::None => write!(f, "None"),
            HyperValue::Bool(b) => write!(f, "{}", b),
            HyperValue::Int(i) => write!(f, "{}", i),
            HyperValue::Real(x) => write!(f, "{}", x),
            HyperValue::Str(s) => write!(f, "'{}'", s),
            HyperValue::Array(a) => write!(f, "an array of length {}", a.len()),
            HyperValue::Matrix(m) => write!(f, "a matrix of shape ({}, {})", m.nrows(), m.ncols()),
            HyperValue::Mapping(v) => write!(f, "{}", v),
        }
    }
}

/// Scalar types a value can be an instance of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Integer,
    /// Floats, and integers since they are real numbers too.
    Real,
    Str,
    Mapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalKind {
    Integral,
    Real,
}

/// Which ends of an [`Interval`] are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closed {
    Left,
    Right,
    Both,
    Neither,
}

impl Closed {
    fn left(self) -> bool {
        matches!(self, Closed::Left | Closed::Both)
    }

    fn right(self) -> bool {
        matches!(self, Closed::Right | Closed::Both)
    }
}

/// A numeric range. `None` bounds are infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<F> {
    pub kind: IntervalKind,
    pub left: Option<F>,
    pub right: Option<F>,
    pub closed: Closed,
}

impl<F: Float> Interval<F> {
    pub fn real(left: Option<F>, right: Option<F>, closed: Closed) -> Self {
        Interval {
            kind: IntervalKind::Real,
            left,
            right,
            closed,
        }
    }

    pub fn integral(left: Option<F>, right: Option<F>, closed: Closed) -> Self {
        Interval {
            kind: IntervalKind::Integral,
            left,
            right,
            closed,
        }
    }

    pub fn contains(&self, value: &HyperValue<F>) -> bool {
        let x = match (self.kind, value) {
            (IntervalKind::Integral, HyperValue::Int(_)) => value.as_real(),
            (IntervalKind::Real, HyperValue::Int(_) | HyperValue::Real(_)) => value.as_real(),
            _ => None,
        };
        let x = match x {
            Some(x) if !x.is_nan() => x,
            _ => return false,
        };
        let above_left = match self.left {
            Some(left) if self.closed.left() => x >= left,
            Some(left) => x > left,
            None => true,
        };
        let below_right = match self.right {
            Some(right) if self.closed.right() => x <= right,
            Some(right) => x < right,
            None => true,
        };
        above_left && below_right
    }

    /// Sign hints implied by the bounds: a zero left bound means
    /// non-negative (positive when open), a positive one means positive, and
    /// symmetrically on the right.
    pub fn sign_hints(&self) -> Vec<Sign> {
        let mut hints = Vec::new();
        if let Some(left) = self.left {
            if left == F::zero() {
                hints.push(if self.closed.left() {
                    Sign::Nonneg
                } else {
                    Sign::Pos
                });
            } else if left > F::zero() {
                hints.push(Sign::Pos);
            }
        }
        if let Some(right) = self.right {
            if right == F::zero() {
                hints.push(if self.closed.right() {
                    Sign::Nonpos
                } else {
                    Sign::Neg
                });
            } else if right < F::zero() {
                hints.push(Sign::Neg);
            }
        }
        hints
    }
}

impl<F: Float> fmt::Display for Interval<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            IntervalKind::Integral => "an int",
            IntervalKind::Real => "a float",
        };
        let left = self.left.map_or("-inf".to_string(), |l| l.to_string());
        let right = self.right.map_or("inf".to_string(), |r| r.to_string());
        let open = if self.closed.left() && self.left.is_some() {
            "["
        } else {
            "("
        };
        let close = if self.closed.right() && self.right.is_some() {
            "]"
        } else {
            ")"
        };
        write!(f, "{} in the range {}{}, {}{}", kind, open, left, right, close)
    }
}

/// A constraint a hyperparameter value may satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamConstraint<F> {
    Boolean,
    InstanceOf(TypeKind),
    Interval(Interval<F>),
    Options(Vec<&'static str>),
    ArrayLike,
    NoneValue,
}

impl<F: Float> ParamConstraint<F> {
    pub fn is_satisfied_by(&self, value: &HyperValue<F>) -> bool {
        match (self, value) {
            (ParamConstraint::Boolean, HyperValue::Bool(_)) => true,
            (ParamConstraint::InstanceOf(kind), value) => match (kind, value) {
                (TypeKind::Integer, HyperValue::Int(_)) => true,
                (TypeKind::Real, HyperValue::Int(_) | HyperValue::Real(_)) => true,
                (TypeKind::Str, HyperValue::Str(_)) => true,
                (TypeKind::Mapping, HyperValue::Mapping(Value::Object(_))) => true,
                _ => false,
            },
            (ParamConstraint::Interval(interval), value) => interval.contains(value),
            (ParamConstraint::Options(options), HyperValue::Str(s)) => {
                options.iter().any(|option| option == s)
            }
            (ParamConstraint::ArrayLike, HyperValue::Array(_) | HyperValue::Matrix(_)) => true,
            (ParamConstraint::NoneValue, HyperValue::None) => true,
            _ => false,
        }
    }
}

impl<F: Float> fmt::Display for ParamConstraint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamConstraint::Boolean => write!(f, "a bool"),
            ParamConstraint::InstanceOf(TypeKind::Integer) => write!(f, "an int"),
            ParamConstraint::InstanceOf(TypeKind::Real) => write!(f, "a float"),
            ParamConstraint::InstanceOf(TypeKind::Str) => write!(f, "a str"),
            ParamConstraint::InstanceOf(TypeKind::Mapping) => write!(f, "a mapping"),
            ParamConstraint::Interval(interval) => write!(f, "{}", interval),
            ParamConstraint::Options(options) => {
                let quoted: Vec<String> = options.iter().map(|o| format!("'{}'", o)).collect();
                write!(f, "a str among {{{}}}", quoted.join(", "))
            }
            ParamConstraint::ArrayLike => write!(f, "an array-like"),
            ParamConstraint::NoneValue => write!(f, "None"),
        }
    }
}

/// Hyperparameter names with their constraint lists.
pub type Declarations<F> = Vec<(&'static str, Vec<ParamConstraint<F>>)>;

/// Human readable description of a constraint list, e.g.
/// `an array-like or None`.
pub fn describe_constraints<F: Float>(constraints: &[ParamConstraint<F>]) -> String {
    let described: Vec<String> = constraints.iter().map(|c| c.to_string()).collect();
    match described.split_last() {
        None => "nothing".to_string(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}

/// The error reported for a value rejected by `constraints`.
pub fn invalid_parameter<F: Float>(
    name: &str,
    value: &HyperValue<F>,
    constraints: &[ParamConstraint<F>],
) -> EstimatorError {
    EstimatorError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        allowed: describe_constraints(constraints),
    }
}

/// A component owning hyperparameters.
pub trait HasHyperparameters<F: Float> {
    /// Plain hyperparameters.
    fn parameter_constraints(&self) -> Declarations<F> {
        Vec::new()
    }

    /// Hyperparameters backed by a live optimization parameter, so that their
    /// value can change without rebuilding the problem.
    fn cvx_parameter_constraints(&self) -> Declarations<F> {
        Vec::new()
    }

    fn get_param(&self, name: &str) -> Option<HyperValue<F>>;

    /// Assigns a hyperparameter. Range checks are deferred to
    /// [`validate_parameter_constraints`], but values that cannot be stored
    /// at all are rejected here.
    fn set_param(&mut self, name: &str, value: HyperValue<F>) -> Result<()>;

    /// Whether this component declares `name`.
    fn declares(&self, name: &str) -> bool {
        self.parameter_constraints()
            .iter()
            .chain(self.cvx_parameter_constraints().iter())
            .any(|(declared, _)| *declared == name)
    }

    /// Constraint list of a declared hyperparameter.
    fn constraints_of(&self, name: &str) -> Option<Vec<ParamConstraint<F>>> {
        self.parameter_constraints()
            .into_iter()
            .chain(self.cvx_parameter_constraints())
            .find(|(declared, _)| *declared == name)
            .map(|(_, constraints)| constraints)
    }
}

/// Checks every declared hyperparameter of every component against its
/// constraint list.
pub fn validate_parameter_constraints<F: Float>(
    components: &[&dyn HasHyperparameters<F>],
) -> Result<()> {
    for component in components {
        let declarations = component
            .parameter_constraints()
            .into_iter()
            .chain(component.cvx_parameter_constraints());
        for (name, constraints) in declarations {
            let value = component
                .get_param(name)
                .ok_or_else(|| EstimatorError::UnknownParameter(name.to_string()))?;
            if !constraints.iter().any(|c| c.is_satisfied_by(&value)) {
                return Err(invalid_parameter(name, &value, &constraints));
            }
        }
    }
    Ok(())
}

/// Hyperparameter names must be unique across components, since the
/// optimization parameters they back are looked up by name.
pub fn check_unique_names<F: Float>(components: &[&dyn HasHyperparameters<F>]) -> Result<()> {
    let mut seen = HashSet::new();
    for component in components {
        let declarations = component
            .parameter_constraints()
            .into_iter()
            .chain(component.cvx_parameter_constraints());
        for (name, _) in declarations {
            if !seen.insert(name) {
                return Err(EstimatorError::DuplicateParameter(name.to_string()));
            }
        }
    }
    Ok(())
}
