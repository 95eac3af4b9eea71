use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ndarray::Array1;

use super::ParameterError;
use crate::Float;

/// Sign attribute of an optimization parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Nonneg,
    Pos,
    Nonpos,
    Neg,
}

impl Sign {
    /// Whether every value satisfying this sign is `>= 0`.
    pub fn is_nonneg(self) -> bool {
        matches!(self, Sign::Nonneg | Sign::Pos)
    }

    /// Whether every value satisfying this sign is `<= 0`.
    pub fn is_nonpos(self) -> bool {
        matches!(self, Sign::Nonpos | Sign::Neg)
    }

    /// Merges two sign hints into the strongest hint implied by both, or
    /// `None` when they contradict each other.
    pub fn merge(self, other: Sign) -> Option<Sign> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Sign::Pos, Sign::Nonneg) | (Sign::Nonneg, Sign::Pos) => Some(Sign::Pos),
            (Sign::Neg, Sign::Nonpos) | (Sign::Nonpos, Sign::Neg) => Some(Sign::Neg),
            _ => None,
        }
    }

    fn admits<F: Float>(self, value: F) -> bool {
        match self {
            Sign::Nonneg => value >= F::zero(),
            Sign::Pos => value > F::zero(),
            Sign::Nonpos => value <= F::zero(),
            Sign::Neg => value < F::zero(),
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sign::Nonneg => "non-negative",
            Sign::Pos => "positive",
            Sign::Nonpos => "non-positive",
            Sign::Neg => "negative",
        };
        write!(f, "{}", s)
    }
}

/// Algebraic attributes of an optimization parameter. They are checked every
/// time a value is assigned and drive the convexity analysis of expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterAttributes {
    pub sign: Option<Sign>,
    pub integer: bool,
    pub boolean: bool,
    /// `None` for a scalar parameter, `Some(n)` for a vector of length `n`.
    pub shape: Option<usize>,
}

/// The value held by a [`Parameter`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue<F> {
    Scalar(F),
    Vector(Array1<F>),
}

impl<F: Float> ParameterValue<F> {
    pub fn shape(&self) -> Option<usize> {
        match self {
            ParameterValue::Scalar(_) => None,
            ParameterValue::Vector(v) => Some(v.len()),
        }
    }

    fn elements(&self) -> Vec<F> {
        match self {
            ParameterValue::Scalar(x) => vec![*x],
            ParameterValue::Vector(v) => v.to_vec(),
        }
    }
}

fn describe_shape(shape: Option<usize>) -> String {
    match shape {
        None => "scalar".to_string(),
        Some(n) => format!("vector of length {}", n),
    }
}

#[derive(Debug)]
struct ParameterData<F> {
    name: String,
    attributes: ParameterAttributes,
    value: RefCell<ParameterValue<F>>,
}

/// A named optimization parameter.
///
/// Expressions capture parameters by handle: cloning a [`Parameter`] shares
/// its value, so assigning a new value is visible to every expression built
/// with it. This is what allows a problem to be solved again with different
/// hyperparameters without being rebuilt.
#[derive(Debug, Clone)]
pub struct Parameter<F> {
    data: Rc<ParameterData<F>>,
}

impl<F: Float> Parameter<F> {
    /// Creates a parameter, checking the initial value against its attributes.
    pub fn new(
        name: &str,
        attributes: ParameterAttributes,
        value: ParameterValue<F>,
    ) -> Result<Self, ParameterError> {
        let parameter = Parameter {
            data: Rc::new(ParameterData {
                name: name.to_string(),
                attributes,
                value: RefCell::new(value.clone()),
            }),
        };
        parameter.check(&value)?;
        Ok(parameter)
    }

    /// Shorthand for an attribute-free scalar parameter.
    pub fn scalar(name: &str, value: F) -> Result<Self, ParameterError> {
        Parameter::new(
            name,
            ParameterAttributes::default(),
            ParameterValue::Scalar(value),
        )
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn attributes(&self) -> ParameterAttributes {
        self.data.attributes
    }

    pub fn sign(&self) -> Option<Sign> {
        self.data.attributes.sign
    }

    pub fn shape(&self) -> Option<usize> {
        self.data.attributes.shape
    }

    pub fn value(&self) -> ParameterValue<F> {
        self.data.value.borrow().clone()
    }

    /// Value of a scalar parameter.
    pub fn scalar_value(&self) -> Result<F, ParameterError> {
        match &*self.data.value.borrow() {
            ParameterValue::Scalar(x) => Ok(*x),
            ParameterValue::Vector(_) => Err(ParameterError::NotScalar {
                name: self.data.name.clone(),
            }),
        }
    }

    /// Value of the parameter broadcast to a vector of length `len`.
    pub fn vector_value(&self, len: usize) -> Result<Array1<F>, ParameterError> {
        match &*self.data.value.borrow() {
            ParameterValue::Scalar(x) => Ok(Array1::from_elem(len, *x)),
            ParameterValue::Vector(v) if v.len() == len => Ok(v.clone()),
            ParameterValue::Vector(v) => Err(ParameterError::ShapeMismatch {
                name: self.data.name.clone(),
                expected: describe_shape(Some(len)),
                found: describe_shape(Some(v.len())),
            }),
        }
    }

    /// Assigns a new value. The previous value is kept when the new one
    /// violates the parameter's attributes.
    pub fn set_value(&self, value: ParameterValue<F>) -> Result<(), ParameterError> {
        self.check(&value)?;
        *self.data.value.borrow_mut() = value;
        Ok(())
    }

    /// Puts back a value previously read from this parameter.
    pub(crate) fn restore_value(&self, value: ParameterValue<F>) {
        *self.data.value.borrow_mut() = value;
    }

    /// Whether both handles refer to the same parameter.
    pub fn same_as(&self, other: &Parameter<F>) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    fn check(&self, value: &ParameterValue<F>) -> Result<(), ParameterError> {
        let name = &self.data.name;
        let attributes = self.data.attributes;
        if value.shape() != attributes.shape {
            return Err(ParameterError::ShapeMismatch {
                name: name.clone(),
                expected: describe_shape(attributes.shape),
                found: describe_shape(value.shape()),
            });
        }
        let elements = value.elements();
        if !elements.iter().all(|x| x.is_finite()) {
            return Err(ParameterError::NonFinite { name: name.clone() });
        }
        if let Some(sign) = attributes.sign {
            if !elements.iter().all(|&x| sign.admits(x)) {
                return Err(ParameterError::SignViolation {
                    name: name.clone(),
                    sign,
                });
            }
        }
        if attributes.boolean && !elements.iter().all(|&x| x == F::zero() || x == F::one()) {
            return Err(ParameterError::NotBoolean { name: name.clone() });
        }
        if attributes.integer && !elements.iter().all(|x| x.fract() == F::zero()) {
            return Err(ParameterError::NotInteger { name: name.clone() });
        }
        Ok(())
    }
}
