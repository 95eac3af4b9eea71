use ndarray::{array, Array1};

use super::*;
use crate::expressions::{
    linear, norm1, sum_squares, weighted_norm1, AffineExpression, Parameter, ParameterAttributes,
    ParameterValue, Sign,
};
use crate::helpers::test_helpers::assert_array_all_close;

fn nonneg(name: &str, value: f64) -> Parameter<f64> {
    let attributes = ParameterAttributes {
        sign: Some(Sign::Nonneg),
        ..Default::default()
    };
    Parameter::new(name, attributes, ParameterValue::Scalar(value)).unwrap()
}

fn least_squares(beta: &Variable<f64>) -> Expression<f64> {
    let X = array![[1., 0.], [0., 1.], [1., 1.]];
    let y = array![1., 1., 2.];
    let residual = AffineExpression::matmul(X, beta)
        .unwrap()
        .minus(y.view())
        .unwrap();
    sum_squares(residual).scaled(1. / 6.)
}

#[test]
fn test_compile_least_squares() {
    let beta = Variable::new(2);
    let problem = Problem::minimize(&beta, least_squares(&beta), None).unwrap();
    let qp = problem.compile().unwrap();
    // 1/6 * ||X beta - y||^2 with X^T X = [[2, 1], [1, 2]], X^T y = [3, 3]
    assert_array_all_close(qp.P.row(0), array![2. / 3., 1. / 3.].view(), 1e-12);
    assert_array_all_close(qp.P.row(1), array![1. / 3., 2. / 3.].view(), 1e-12);
    assert_array_all_close(qp.q.view(), array![-1., -1.].view(), 1e-12);
    assert!((qp.r - 1.).abs() < 1e-12);
    assert!(qp.lower.iter().all(|l| l.is_infinite()));
}

#[test]
fn test_solve_writes_variable() {
    let beta = Variable::new(2);
    let problem = Problem::minimize(&beta, least_squares(&beta), None).unwrap();
    assert!(beta.value().is_none());

    let report = problem.solve(None, &SolverOptions::default(), false).unwrap();
    assert_eq!(report.solver, "CD");
    assert_eq!(report.status, SolveStatus::Optimal);
    assert!(report.objective.abs() < 1e-10);
    assert_array_all_close(beta.value().unwrap().view(), array![1., 1.].view(), 1e-8);
}

#[test]
fn test_parameters_are_read_at_solve_time() {
    let beta = Variable::new(2);
    let eta = nonneg("eta", 0.);
    let objective = least_squares(&beta) + norm1(&beta).times(&eta).unwrap();
    let problem = Problem::minimize(&beta, objective, None).unwrap();

    problem.solve(Some("FISTA"), &SolverOptions::default(), false).unwrap();
    assert_array_all_close(beta.value().unwrap().view(), array![1., 1.].view(), 1e-8);

    // a large penalty shrinks every coefficient to zero without rebuilding
    eta.set_value(ParameterValue::Scalar(10.)).unwrap();
    assert_eq!(problem.compile().unwrap().l1, array![10., 10.]);
    problem.solve(None, &SolverOptions::default(), true).unwrap();
    assert_eq!(beta.value().unwrap(), Array1::<f64>::zeros(2));
}

#[test]
fn test_weighted_norm_and_linear_terms() {
    let beta = Variable::new(2);
    let attributes = ParameterAttributes {
        sign: Some(Sign::Nonneg),
        shape: Some(2),
        ..Default::default()
    };
    let weights =
        Parameter::new("alpha", attributes, ParameterValue::Vector(array![0.5, 2.])).unwrap();
    let objective = weighted_norm1(&beta, &weights).unwrap().scaled(2.)
        + linear(&beta, array![1., -1.]).unwrap();
    let problem = Problem::minimize(&beta, objective, None).unwrap();
    let qp = problem.compile().unwrap();
    assert_eq!(qp.l1, array![1., 4.]);
    assert_eq!(qp.q, array![1., -1.]);
}

#[test]
fn test_constraints_are_intersected() {
    let beta = Variable::new(2);
    let constraints = vec![
        Constraint::nonneg(&beta),
        Constraint::upper_bound(&beta, array![0.5, f64::INFINITY]).unwrap(),
        Constraint::lower_bound(&beta, array![-1., 0.25]).unwrap(),
    ];
    let problem = Problem::minimize(&beta, least_squares(&beta), Some(constraints)).unwrap();
    let qp = problem.compile().unwrap();
    assert_eq!(qp.lower, array![0., 0.25]);
    assert_eq!(qp.upper, array![0.5, f64::INFINITY]);

    problem.solve(None, &SolverOptions::default(), false).unwrap();
    let solution = beta.value().unwrap();
    assert!((solution[0] - 0.5).abs() < 1e-8);
    // minimizes (beta_1 - 1)^2 + (0.5 + beta_1 - 2)^2 over beta_1
    assert!((solution[1] - 1.25).abs() < 1e-8);
}

#[test]
fn test_minimize_rejects_nonconvex_objective() {
    let beta = Variable::new(2);
    let lambda = Parameter::scalar("lambda", 1.).unwrap();
    let objective = least_squares(&beta) + norm1(&beta).times(&lambda).unwrap();
    assert_eq!(
        Problem::minimize(&beta, objective, None).unwrap_err(),
        ProblemError::NotConvex
    );
}

#[test]
fn test_minimize_rejects_foreign_variables() {
    let beta = Variable::new(2);
    let other = Variable::new(2);
    assert_eq!(
        Problem::minimize(&beta, least_squares(&other), None).unwrap_err(),
        ProblemError::VariableMismatch
    );
    assert_eq!(
        Problem::minimize(
            &beta,
            least_squares(&beta),
            Some(vec![Constraint::nonneg(&other)])
        )
        .unwrap_err(),
        ProblemError::VariableMismatch
    );
}

#[test]
fn test_failed_solve_leaves_variable_untouched() {
    let beta = Variable::new(2);
    let problem = Problem::minimize(&beta, least_squares(&beta), None).unwrap();
    problem.solve(None, &SolverOptions::default(), false).unwrap();

    let constraints = vec![
        Constraint::lower_bound(&beta, array![1., 1.]).unwrap(),
        Constraint::upper_bound(&beta, array![0., 2.]).unwrap(),
    ];
    let infeasible = Problem::minimize(&beta, least_squares(&beta), Some(constraints)).unwrap();
    assert_eq!(
        infeasible.solve(None, &SolverOptions::default(), false),
        Err(ProblemError::OptimizationFailed {
            solver: "CD",
            status: SolveStatus::Infeasible
        })
    );
    assert_array_all_close(beta.value().unwrap().view(), array![1., 1.].view(), 1e-8);
}

#[test]
fn test_unknown_solver() {
    let beta = Variable::new(2);
    let problem = Problem::minimize(&beta, least_squares(&beta), None).unwrap();
    assert!(matches!(
        problem.solve(Some("ECOS"), &SolverOptions::default(), false),
        Err(ProblemError::Solver(SolverError::UnknownSolver(_)))
    ));
}

#[test]
fn test_unbounded_problem() {
    let beta = Variable::new(1);
    let objective = linear(&beta, array![1.]).unwrap();
    let problem = Problem::minimize(&beta, objective, None).unwrap();
    assert!(matches!(
        problem.solve(None, &SolverOptions::default(), false),
        Err(ProblemError::OptimizationFailed {
            status: SolveStatus::Unbounded,
            ..
        })
    ));
}

#[test]
fn test_unbounded_along_singular_curvature() {
    let beta = Variable::new(2);
    let objective = sum_squares(AffineExpression::matmul(array![[1., 1.]], &beta).unwrap())
        + linear(&beta, array![1., -1.]).unwrap();
    let problem = Problem::minimize(&beta, objective, None).unwrap();
    let options = SolverOptions::default().max_iter(1000);
    for solver in ["CD", "FISTA"] {
        assert_eq!(
            problem.solve(Some(solver), &options, false),
            Err(ProblemError::OptimizationFailed {
                solver,
                status: SolveStatus::Unbounded
            })
        );
    }
    assert!(beta.value().is_none());
}
