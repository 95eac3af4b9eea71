//! Translation of hyperparameters into live optimization parameters.

use ndarray::Array1;

use super::declarations::{HasHyperparameters, HyperValue, IntervalKind, ParamConstraint, TypeKind};
use super::error::{EstimatorError, Result};
use crate::expressions::{Parameter, ParameterAttributes, ParameterError, ParameterValue, Sign};
use crate::Float;

/// The live parameters of an assembled problem, looked up by hyperparameter
/// name.
#[derive(Debug, Clone, Default)]
pub struct CvxParameters<F> {
    parameters: Vec<Parameter<F>>,
}

impl<F: Float> CvxParameters<F> {
    pub fn get(&self, name: &str) -> Option<&Parameter<F>> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter<F>> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Current values, in the order of [`CvxParameters::names`].
    pub fn values(&self) -> Vec<ParameterValue<F>> {
        self.parameters.iter().map(|p| p.value()).collect()
    }

    /// Puts back values taken with [`CvxParameters::values`].
    pub fn restore(&self, values: Vec<ParameterValue<F>>) {
        for (parameter, value) in self.parameters.iter().zip(values) {
            parameter.restore_value(value);
        }
    }
}

/// Derives the algebraic attributes of a parameter from ALL of its
/// constraints, independently of their order.
///
/// Sign hints are merged to the strongest consistent one (positive over
/// non-negative, negative over non-positive), while hints from opposite
/// families are rejected. A boolean parameter is not also flagged integer.
pub fn infer_attributes<F: Float>(
    name: &str,
    constraints: &[ParamConstraint<F>],
    value: &HyperValue<F>,
) -> std::result::Result<ParameterAttributes, ParameterError> {
    let mut attributes = ParameterAttributes::default();
    let mut hints: Vec<Sign> = Vec::new();

    for constraint in constraints {
        match constraint {
            ParamConstraint::ArrayLike => {
                if let HyperValue::Array(array) = value {
                    attributes.shape = Some(array.len());
                }
            }
            ParamConstraint::Boolean => attributes.boolean = true,
            ParamConstraint::InstanceOf(TypeKind::Integer) => attributes.integer = true,
            ParamConstraint::Interval(interval) => {
                if interval.kind == IntervalKind::Integral {
                    attributes.integer = true;
                }
                hints.extend(interval.sign_hints());
            }
            _ => {}
        }
    }
    if attributes.boolean {
        attributes.integer = false;
    }

    for hint in hints {
        attributes.sign = match attributes.sign {
            None => Some(hint),
            Some(sign) => Some(sign.merge(hint).ok_or(ParameterError::ConflictingHints {
                name: name.to_string(),
                first: sign,
                second: hint,
            })?),
        };
    }
    Ok(attributes)
}

fn scalar_of<F: Float>(name: &str, value: &HyperValue<F>) -> Result<F> {
    match value {
        HyperValue::Bool(b) => Ok(if *b { F::one() } else { F::zero() }),
        value => value
            .as_real()
            .ok_or_else(|| EstimatorError::InvalidParameter {
                name: name.to_string(),
                value: value.to_string(),
                allowed: "a number or an array-like".to_string(),
            }),
    }
}

fn initial_value<F: Float>(name: &str, value: &HyperValue<F>) -> Result<ParameterValue<F>> {
    match value {
        HyperValue::Array(array) => Ok(ParameterValue::Vector(array.clone())),
        value => Ok(ParameterValue::Scalar(scalar_of(name, value)?)),
    }
}

/// Creates one live parameter per solver-parameterized hyperparameter of the
/// components, initialized with the hyperparameter's current value.
pub fn generate_parameters<F: Float>(
    components: &[&dyn HasHyperparameters<F>],
) -> Result<CvxParameters<F>> {
    let mut parameters = Vec::new();
    for component in components {
        for (name, constraints) in component.cvx_parameter_constraints() {
            let value = component
                .get_param(name)
                .ok_or_else(|| EstimatorError::UnknownParameter(name.to_string()))?;
            let attributes = infer_attributes(name, &constraints, &value)?;
            let parameter = Parameter::new(name, attributes, initial_value(name, &value)?)?;
            parameters.push(parameter);
        }
    }
    Ok(CvxParameters { parameters })
}

/// Pushes the current hyperparameter values into the live parameters of an
/// assembled problem. Scalars and length-1 arrays are broadcast to the
/// parameter's shape.
pub fn set_parameter_values<F: Float>(
    parameters: &CvxParameters<F>,
    components: &[&dyn HasHyperparameters<F>],
) -> Result<()> {
    for component in components {
        for (name, _) in component.cvx_parameter_constraints() {
            let value = component
                .get_param(name)
                .ok_or_else(|| EstimatorError::UnknownParameter(name.to_string()))?;
            let parameter = parameters
                .get(name)
                .ok_or_else(|| EstimatorError::MissingParameter(name.to_string()))?;

            let new_value = match &value {
                HyperValue::Array(array) if array.len() != 1 => {
                    ParameterValue::Vector(array.clone())
                }
                HyperValue::Array(array) => broadcast(array[0], parameter.shape()),
                value => broadcast(scalar_of(name, value)?, parameter.shape()),
            };
            parameter.set_value(new_value)?;
        }
    }
    Ok(())
}

fn broadcast<F: Float>(x: F, shape: Option<usize>) -> ParameterValue<F> {
    match shape {
        Some(len) => ParameterValue::Vector(Array1::from_elem(len, x)),
        None => ParameterValue::Scalar(x),
    }
}
