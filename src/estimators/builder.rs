use ndarray::{ArrayView1, ArrayView2};

use super::declarations::{Declarations, HasHyperparameters, HyperValue};
use super::error::Result;
use super::translator::{generate_parameters, CvxParameters};
use crate::expressions::{Constraint, Expression, Variable};
use crate::problem::Problem;
use crate::Float;

/// The hooks a regression variant implements to describe its optimization
/// problem. Only the objective is mandatory.
pub trait ProblemBuilder<F: Float>: HasHyperparameters<F> {
    /// Derived expressions shared by the objective and the constraints.
    type Auxiliaries;

    fn generate_auxiliaries(
        &self,
        _x: ArrayView2<F>,
        _y: ArrayView1<F>,
        _beta: &Variable<F>,
        _parameters: &CvxParameters<F>,
    ) -> Result<Option<Self::Auxiliaries>> {
        Ok(None)
    }

    /// The convex expression to minimize.
    fn generate_objective(
        &self,
        x: ArrayView2<F>,
        y: ArrayView1<F>,
        beta: &Variable<F>,
        parameters: &CvxParameters<F>,
        auxiliaries: Option<&Self::Auxiliaries>,
    ) -> Result<Expression<F>>;

    /// Constraints on the coefficients, `None` when unconstrained.
    fn generate_constraints(
        &self,
        _x: ArrayView2<F>,
        _y: ArrayView1<F>,
        _beta: &Variable<F>,
        _parameters: &CvxParameters<F>,
        _auxiliaries: Option<&Self::Auxiliaries>,
    ) -> Result<Option<Vec<Constraint<F>>>> {
        Ok(None)
    }
}

/// Everything a [`Regularizer`] may read while adding its term. The context
/// is borrowed immutably, so regularizers forward the parameters and
/// auxiliaries unchanged to the next one.
pub struct BuildContext<'a, F, A> {
    pub x: ArrayView2<'a, F>,
    pub y: ArrayView1<'a, F>,
    pub beta: &'a Variable<F>,
    pub parameters: &'a CvxParameters<F>,
    pub auxiliaries: Option<&'a A>,
}

/// A stage of the objective pipeline: receives the objective built so far and
/// returns it with a penalty term added. Regularizers are applied in the
/// order they were added to the estimator.
pub trait Regularizer<F: Float, A>: HasHyperparameters<F> {
    fn apply(&self, objective: Expression<F>, context: &BuildContext<F, A>)
        -> Result<Expression<F>>;
}

impl<F: Float, A> HasHyperparameters<F> for Box<dyn Regularizer<F, A>> {
    fn parameter_constraints(&self) -> Declarations<F> {
        (**self).parameter_constraints()
    }

    fn cvx_parameter_constraints(&self) -> Declarations<F> {
        (**self).cvx_parameter_constraints()
    }

    fn get_param(&self, name: &str) -> Option<HyperValue<F>> {
        (**self).get_param(name)
    }

    fn set_param(&mut self, name: &str, value: HyperValue<F>) -> Result<()> {
        (**self).set_param(name, value)
    }
}

/// The assembled problem along with the handles needed to solve it again.
#[derive(Debug)]
pub struct Canonicals<F, A> {
    pub problem: Problem<F>,
    pub beta: Variable<F>,
    pub parameters: CvxParameters<F>,
    pub auxiliaries: Option<A>,
}

impl<F: Float, A> Canonicals<F, A> {
    pub fn objective(&self) -> &Expression<F> {
        self.problem.objective()
    }

    /// `None` for an unconstrained problem.
    pub fn constraints(&self) -> Option<&[Constraint<F>]> {
        match self.problem.constraints() {
            [] => None,
            constraints => Some(constraints),
        }
    }
}

/// Builds a brand-new problem for `(x, y)`: a fresh decision variable, one
/// live parameter per solver-parameterized hyperparameter, then the builder
/// hooks (auxiliaries, objective, constraints) with the regularizers applied
/// to the objective in order.
pub fn generate_problem<F: Float, B: ProblemBuilder<F>>(
    x: ArrayView2<F>,
    y: ArrayView1<F>,
    builder: &B,
    regularizers: &[Box<dyn Regularizer<F, B::Auxiliaries>>],
    components: &[&dyn HasHyperparameters<F>],
) -> Result<Canonicals<F, B::Auxiliaries>> {
    let beta = Variable::new(x.ncols());
    let parameters = generate_parameters(components)?;

    let auxiliaries = builder.generate_auxiliaries(x, y, &beta, &parameters)?;
    let mut objective =
        builder.generate_objective(x, y, &beta, &parameters, auxiliaries.as_ref())?;
    {
        let context = BuildContext {
            x: x.view(),
            y: y.view(),
            beta: &beta,
            parameters: &parameters,
            auxiliaries: auxiliaries.as_ref(),
        };
        for regularizer in regularizers.iter() {
            objective = regularizer.apply(objective, &context)?;
        }
    }
    let constraints =
        builder.generate_constraints(x, y, &beta, &parameters, auxiliaries.as_ref())?;

    let problem = Problem::minimize(&beta, objective, constraints)?;
    Ok(Canonicals {
        problem,
        beta,
        parameters,
        auxiliaries,
    })
}
