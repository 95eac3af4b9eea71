use ndarray::{array, Array1, Array2};

use super::*;

fn nonneg_scalar(name: &str, value: f64) -> Parameter<f64> {
    let attributes = ParameterAttributes {
        sign: Some(Sign::Nonneg),
        ..Default::default()
    };
    Parameter::new(name, attributes, ParameterValue::Scalar(value)).unwrap()
}

#[test]
fn test_sign_merge() {
    assert_eq!(Sign::Nonneg.merge(Sign::Pos), Some(Sign::Pos));
    assert_eq!(Sign::Neg.merge(Sign::Nonpos), Some(Sign::Neg));
    assert_eq!(Sign::Nonneg.merge(Sign::Nonneg), Some(Sign::Nonneg));
    assert_eq!(Sign::Nonneg.merge(Sign::Nonpos), None);
    assert_eq!(Sign::Pos.merge(Sign::Neg), None);
}

#[test]
fn test_parameter_checks_sign() {
    let eta = nonneg_scalar("eta", 0.5);
    assert_eq!(eta.scalar_value().unwrap(), 0.5);
    assert_eq!(
        eta.set_value(ParameterValue::Scalar(-1.)),
        Err(ParameterError::SignViolation {
            name: "eta".to_string(),
            sign: Sign::Nonneg
        })
    );
    // the rejected value is not stored
    assert_eq!(eta.scalar_value().unwrap(), 0.5);
}

#[test]
fn test_parameter_checks_integer_and_boolean() {
    let attributes = ParameterAttributes {
        integer: true,
        ..Default::default()
    };
    let k = Parameter::new("k", attributes, ParameterValue::Scalar(3.)).unwrap();
    assert!(k.set_value(ParameterValue::Scalar(2.5)).is_err());

    let attributes = ParameterAttributes {
        boolean: true,
        ..Default::default()
    };
    assert!(Parameter::new("flag", attributes, ParameterValue::Scalar(2.)).is_err());
    assert!(Parameter::new("flag", attributes, ParameterValue::Scalar(1.)).is_ok());
}

#[test]
fn test_parameter_checks_shape() {
    let attributes = ParameterAttributes {
        shape: Some(3),
        ..Default::default()
    };
    let w = Parameter::new("w", attributes, ParameterValue::Vector(array![1., 2., 3.])).unwrap();
    assert!(w.set_value(ParameterValue::Scalar(1.)).is_err());
    assert!(w
        .set_value(ParameterValue::Vector(array![1., 2.]))
        .is_err());
    assert!(w.scalar_value().is_err());
    assert_eq!(w.vector_value(3).unwrap(), array![1., 2., 3.]);
}

#[test]
fn test_parameter_handles_share_value() {
    let eta = nonneg_scalar("eta", 1.);
    let handle = eta.clone();
    handle.set_value(ParameterValue::Scalar(4.)).unwrap();
    assert_eq!(eta.scalar_value().unwrap(), 4.);
    assert!(eta.same_as(&handle));
    assert!(!eta.same_as(&nonneg_scalar("eta", 4.)));
}

#[test]
fn test_affine_shapes() {
    let beta = Variable::<f64>::new(2);
    let X = array![[1., 0.], [0., 1.], [1., 1.]];
    let y = array![1., 1., 2.];
    let residual = AffineExpression::matmul(X.clone(), &beta)
        .unwrap()
        .minus(y.view())
        .unwrap();
    assert_eq!(residual.offset(), &y);
    assert!(residual.value().is_none());

    beta.set_value(array![1., 1.]);
    assert_eq!(residual.value().unwrap(), Array1::<f64>::zeros(3));

    let wrong = Array2::<f64>::zeros((3, 3));
    assert!(AffineExpression::matmul(wrong, &beta).is_err());
    assert!(AffineExpression::matmul(X, &beta)
        .unwrap()
        .minus(array![1.].view())
        .is_err());
}

#[test]
fn test_scale_value_and_sign() {
    let beta = Variable::<f64>::new(2);
    let eta = nonneg_scalar("eta", 0.25);
    let objective = norm1(&beta).scaled(4.).times(&eta).unwrap();
    let scale = &objective.terms()[0].scale;
    assert_eq!(scale.value().unwrap(), 1.);
    assert!(scale.is_nonneg());
    assert!(objective.is_convex());
}

#[test]
fn test_unsigned_parameter_breaks_convexity() {
    let beta = Variable::<f64>::new(2);
    let lambda = Parameter::scalar("lambda", 1.).unwrap();
    let objective = norm1(&beta).times(&lambda).unwrap();
    assert!(!objective.is_convex());

    let negated = norm1(&beta).scaled(-1.);
    assert!(!negated.is_convex());

    // a linear term is convex whatever its sign
    let linear_term = linear(&beta, array![1., -1.]).unwrap().scaled(-3.);
    assert!(linear_term.is_convex());
}

#[test]
fn test_two_nonpositive_parameters_are_convex() {
    let beta = Variable::<f64>::new(1);
    let attributes = ParameterAttributes {
        sign: Some(Sign::Nonpos),
        ..Default::default()
    };
    let a = Parameter::new("a", attributes, ParameterValue::Scalar(-1.)).unwrap();
    let b = Parameter::new("b", attributes, ParameterValue::Scalar(-2.)).unwrap();
    let objective = norm1(&beta).times(&a).unwrap().times(&b).unwrap();
    assert!(objective.is_convex());
}

#[test]
fn test_vector_parameter_cannot_scale() {
    let beta = Variable::<f64>::new(2);
    let attributes = ParameterAttributes {
        sign: Some(Sign::Nonneg),
        shape: Some(2),
        ..Default::default()
    };
    let alpha = Parameter::new("alpha", attributes, ParameterValue::Vector(array![1., 2.])).unwrap();
    assert!(norm1(&beta).times(&alpha).is_err());
    let weighted = weighted_norm1(&beta, &alpha).unwrap();
    assert!(weighted.is_convex());
    assert!(weighted_norm1(&Variable::new(3), &alpha).is_err());
}

#[test]
fn test_expression_addition() {
    let beta = Variable::<f64>::new(2);
    let mut objective = norm1(&beta) + linear(&beta, array![1., 1.]).unwrap();
    objective += Expression::zero();
    assert_eq!(objective.terms().len(), 2);
}

#[test]
fn test_constraints() {
    let beta = Variable::<f64>::new(2);
    let nonneg = Constraint::nonneg(&beta);
    assert_eq!(nonneg.lower(), &array![0., 0.]);
    assert!(nonneg.upper().iter().all(|u| u.is_infinite()));

    let upper = Constraint::upper_bound(&beta, array![1., 2.]).unwrap();
    assert!(upper.lower().iter().all(|l| *l == f64::NEG_INFINITY));

    assert!(Constraint::lower_bound(&beta, array![0.]).is_err());
    assert_eq!(
        Constraint::bounds(&beta, array![0., f64::NAN], array![1., 1.]).unwrap_err(),
        ExpressionError::NanBound
    );
}
