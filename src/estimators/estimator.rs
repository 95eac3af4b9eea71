use std::rc::Rc;

use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::builder::{generate_problem, Canonicals, ProblemBuilder, Regularizer};
use super::declarations::{
    check_unique_names, validate_parameter_constraints, HasHyperparameters, HyperValue,
};
use super::error::{EstimatorError, Result};
use super::hyperparams::{CvxParams, ParamGuard};
use super::traits::{Fit, Predict};
use super::translator::set_parameter_values;
use crate::datasets::{check_array, check_x_y, DatasetBase, DatasetError};
use crate::preprocessing::{check_sample_weight, preprocess_data, rescale_data, set_intercept};
use crate::solvers::SolverOptions;
use crate::Float;

/// Owned copy of the preprocessed training data a problem was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingCache<F> {
    x: Array2<F>,
    y: Array1<F>,
}

impl<F: Float> TrainingCache<F> {
    fn new(x: ArrayView2<F>, y: ArrayView1<F>) -> Self {
        TrainingCache {
            x: x.to_owned(),
            y: y.to_owned(),
        }
    }

    /// Elementwise equality, shapes included.
    pub fn matches(&self, x: ArrayView2<F>, y: ArrayView1<F>) -> bool {
        self.x.shape() == x.shape() && self.y.len() == y.len() && self.x == x && self.y == y
    }
}

/// What a successful fit leaves behind.
#[derive(Debug)]
struct FitState<F, A> {
    coefficients: Array1<F>,
    intercept: F,
    canonicals: Rc<Canonicals<F, A>>,
    cache: Option<TrainingCache<F>>,
}

/// A linear regression estimator whose coefficients minimize a convex
/// problem.
///
/// The problem is described by a [`ProblemBuilder`] (data-fitting objective
/// and constraints) followed by an ordered list of [`Regularizer`]s. With
/// warm start enabled, fitting again on unchanged data reuses the assembled
/// problem: the hyperparameter values are pushed into its live parameters
/// and the solver starts from the previous solution.
///
/// The estimator shares parameter handles with its problem and is therefore
/// neither `Send` nor `Sync`.
pub struct CvxEstimator<F: Float, B: ProblemBuilder<F>> {
    params: CvxParams,
    builder: B,
    regularizers: Vec<Box<dyn Regularizer<F, B::Auxiliaries>>>,
    state: Option<FitState<F, B::Auxiliaries>>,
}

impl<F: Float, B: ProblemBuilder<F>> CvxEstimator<F, B> {
    pub fn new(params: CvxParams, builder: B) -> Result<Self> {
        let estimator = CvxEstimator {
            params,
            builder,
            regularizers: Vec::new(),
            state: None,
        };
        check_unique_names(&estimator.components())?;
        Ok(estimator)
    }

    /// Appends a regularizer to the objective pipeline. Its hyperparameter
    /// names must not clash with the ones already declared.
    pub fn with_regularizer<R>(mut self, regularizer: R) -> Result<Self>
    where
        R: Regularizer<F, B::Auxiliaries> + 'static,
    {
        self.regularizers.push(Box::new(regularizer));
        check_unique_names(&self.components())?;
        Ok(self)
    }

    pub fn params(&self) -> &CvxParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut CvxParams {
        &mut self.params
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// This method is a getter for the coefficients vector.
    pub fn coefficients(&self) -> Result<ArrayView1<F>> {
        self.fitted().map(|state| state.coefficients.view())
    }

    pub fn intercept(&self) -> Result<F> {
        self.fitted().map(|state| state.intercept)
    }

    /// The problem solved by the last fit.
    pub fn canonicals(&self) -> Result<&Rc<Canonicals<F, B::Auxiliaries>>> {
        self.fitted().map(|state| &state.canonicals)
    }

    fn fitted(&self) -> Result<&FitState<F, B::Auxiliaries>> {
        self.state.as_ref().ok_or(EstimatorError::NotFitted)
    }

    fn components(&self) -> Vec<&dyn HasHyperparameters<F>> {
        let mut components: Vec<&dyn HasHyperparameters<F>> = vec![&self.params, &self.builder];
        components.extend(
            self.regularizers
                .iter()
                .map(|regularizer| regularizer as &dyn HasHyperparameters<F>),
        );
        components
    }

    /// Every hyperparameter of the estimator, in declaration order.
    pub fn get_params(&self) -> Vec<(&'static str, HyperValue<F>)> {
        let mut params = Vec::new();
        for component in self.components() {
            let declarations = component
                .parameter_constraints()
                .into_iter()
                .chain(component.cvx_parameter_constraints());
            for (name, _) in declarations {
                if let Some(value) = component.get_param(name) {
                    params.push((name, value));
                }
            }
        }
        params
    }

    pub fn get_param(&self, name: &str) -> Option<HyperValue<F>> {
        self.components()
            .into_iter()
            .find(|component| component.declares(name))
            .and_then(|component| component.get_param(name))
    }

    /// Assigns a hyperparameter of whichever component declares it. The value
    /// is validated against its constraints at the next fit.
    pub fn set_param(&mut self, name: &str, value: HyperValue<F>) -> Result<()> {
        let mut components: Vec<&mut dyn HasHyperparameters<F>> =
            vec![&mut self.params, &mut self.builder];
        components.extend(
            self.regularizers
                .iter_mut()
                .map(|regularizer| regularizer as &mut dyn HasHyperparameters<F>),
        );
        match components.into_iter().find(|component| component.declares(name)) {
            Some(component) => component.set_param(name, value),
            None => Err(EstimatorError::UnknownParameter(name.to_string())),
        }
    }

    /// Fits the estimator to `x` and `y`, with optional per-sample weights.
    ///
    /// Previously fitted coefficients, intercept and problem are only
    /// replaced once the solver succeeded.
    pub fn fit_with_weights(
        &mut self,
        x: ArrayView2<F>,
        y: ArrayView1<F>,
        sample_weight: Option<ArrayView1<F>>,
    ) -> Result<&mut Self> {
        check_x_y(x, y)?;

        let params = self.params.check_ref()?.clone();
        validate_parameter_constraints(&self.components())?;
        let solver_options = SolverOptions::from_json(params.solver_options())?;

        let sample_weight = sample_weight
            .map(|sw| check_sample_weight(sw, x.nrows()))
            .transpose()?;

        let data = preprocess_data(
            x.view(),
            y.view(),
            params.fit_intercept(),
            params.copy_x(),
            sample_weight.as_ref().map(|sw| sw.view()),
        )?;
        let (x_fit, y_fit) = match &sample_weight {
            Some(sw) => rescale_data(data.x, data.y, sw.view()),
            None => (data.x, data.y),
        };

        let previous = self
            .state
            .as_ref()
            .filter(|_| params.warm_start())
            .filter(|state| {
                state
                    .cache
                    .as_ref()
                    .map_or(false, |cache| cache.matches(x_fit.view(), y_fit.view()))
            })
            .map(|state| Rc::clone(&state.canonicals));

        // values to put back if the warm solve fails
        let mut snapshot = None;
        let canonicals = match previous {
            Some(canonicals) => {
                debug!("training data unchanged, reusing the assembled problem");
                let values = canonicals.parameters.values();
                if let Err(err) = set_parameter_values(&canonicals.parameters, &self.components()) {
                    canonicals.parameters.restore(values);
                    return Err(err);
                }
                snapshot = Some(values);
                canonicals
            }
            None => {
                debug!(
                    "assembling problem for {} samples and {} features",
                    x_fit.nrows(),
                    x_fit.ncols()
                );
                Rc::new(generate_problem(
                    x_fit.view(),
                    y_fit.view(),
                    &self.builder,
                    &self.regularizers,
                    &self.components(),
                )?)
            }
        };

        let report = match canonicals
            .problem
            .solve(params.solver(), &solver_options, params.warm_start())
        {
            Ok(report) => report,
            Err(err) => {
                if let Some(values) = snapshot {
                    canonicals.parameters.restore(values);
                }
                return Err(err.into());
            }
        };

        let (coefficients, intercept) = set_intercept(
            report.solution,
            data.x_offset.view(),
            data.y_offset,
            data.x_scale.view(),
            params.fit_intercept(),
        );
        let cache = if params.warm_start() {
            Some(TrainingCache::new(x_fit.view(), y_fit.view()))
        } else {
            None
        };

        self.state = Some(FitState {
            coefficients,
            intercept,
            canonicals,
            cache,
        });
        Ok(self)
    }
}

impl<F: Float, B: ProblemBuilder<F>> Fit<F> for CvxEstimator<F, B> {
    fn fit(&mut self, dataset: &DatasetBase<F>) -> Result<&mut Self> {
        self.fit_with_weights(
            dataset.design_matrix(),
            dataset.targets(),
            dataset.sample_weight(),
        )
    }
}

impl<F: Float, B: ProblemBuilder<F>> Predict<F> for CvxEstimator<F, B> {
    fn predict(&self, x: ArrayView2<F>) -> Result<Array1<F>> {
        let state = self.fitted()?;
        check_array(x)?;
        if x.ncols() != state.coefficients.len() {
            return Err(DatasetError::FeatureMismatch {
                expected: state.coefficients.len(),
                found: x.ncols(),
            }
            .into());
        }
        Ok(x.dot(&state.coefficients) + state.intercept)
    }
}
