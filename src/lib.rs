#![allow(non_snake_case)]

//! Regularized linear regression estimators whose coefficients are obtained by
//! assembling and solving a convex optimization problem.
//!
//! An estimator is a [`estimators::CvxEstimator`] parametrized by a
//! [`estimators::ProblemBuilder`] (the data-fitting objective and optional
//! constraints) and an ordered list of [`estimators::Regularizer`]s (penalty
//! terms added on top of the objective). Hyperparameters declared as
//! solver-parameterized become live [`expressions::Parameter`]s, so a warm
//! started fit on unchanged data only updates their values instead of
//! rebuilding the problem.

use ndarray::ScalarOperand;

use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast};

use std::cmp::PartialOrd;
use std::fmt;
use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

/// Float point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point
/// number and implement them for 32bit and 64bit float points.
/// Ref: https://github.com/rust-ml/linfa/blob/master/src/dataset/mod.rs#L36
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Sum
    + NumAssignOps
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + ScalarOperand
    + approx::AbsDiffEq<Epsilon = Self>
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}

impl Float for f64 {}

pub mod datasets;
pub mod estimators;
pub mod expressions;
pub mod helpers;
pub mod preprocessing;
pub mod problem;
pub mod solvers;
