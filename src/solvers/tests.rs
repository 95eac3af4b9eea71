use ndarray::{array, Array1, Array2};
use serde_json::json;

use super::cd::cd_epoch;
use super::fista::gershgorin_bound;
use super::*;
use crate::helpers::helpers::solve_lin_sys;
use crate::helpers::test_helpers::*;

/// `1/(2n) ||X w - y||^2 + alpha ||w||_1 + lambda ||w||^2` in canonical form.
fn regression_qp(X: &Array2<f64>, y: &Array1<f64>, alpha: f64, lambda: f64) -> QuadraticProgram<f64> {
    let n_samples = X.nrows() as f64;
    let n_features = X.ncols();
    let mut qp = QuadraticProgram::zeros(n_features);
    qp.P = X.t().dot(X) / n_samples + Array2::<f64>::eye(n_features) * (2. * lambda);
    qp.q = -X.t().dot(y) / n_samples;
    qp.r = y.dot(y) / (2. * n_samples);
    qp.l1 = Array1::from_elem(n_features, alpha);
    qp
}

#[test]
fn test_registry() {
    assert_eq!(installed_solvers(), &["CD", "FISTA"]);
    assert_eq!(default_solver(), "CD");
    assert_eq!(solver_backend::<f64>(None).unwrap().name(), "CD");
    assert_eq!(solver_backend::<f64>(Some("FISTA")).unwrap().name(), "FISTA");
    assert!(matches!(
        solver_backend::<f64>(Some("SCS")),
        Err(SolverError::UnknownSolver(name)) if name == "SCS"
    ));
}

#[test]
fn test_solver_options_from_json() {
    let options = SolverOptions::<f64>::from_json(None).unwrap();
    assert_eq!(options, SolverOptions::default());

    let value = json!({"max_iter": 50, "tol": 1e-6, "use_acceleration": false, "K": 3, "verbose": true});
    let options = SolverOptions::<f64>::from_json(Some(&value)).unwrap();
    assert_eq!(options.get_max_iter(), 50);
    assert_eq!(options.get_tol(), 1e-6);
    assert!(!options.get_use_acceleration());
    assert_eq!(options.get_K(), 3);
    assert!(options.get_verbose());
}

#[test]
fn test_solver_options_rejects_invalid_entries() {
    let unknown = json!({"eps_abs": 1e-3});
    assert!(matches!(
        SolverOptions::<f64>::from_json(Some(&unknown)),
        Err(SolverError::InvalidOption { key, .. }) if key == "eps_abs"
    ));

    let mistyped = json!({"max_iter": "many"});
    assert!(SolverOptions::<f64>::from_json(Some(&mistyped)).is_err());

    let negative_tol = json!({"tol": -1.});
    assert!(SolverOptions::<f64>::from_json(Some(&negative_tol)).is_err());

    assert_eq!(
        SolverOptions::<f64>::from_json(Some(&json!([1, 2]))),
        Err(SolverError::NotAMapping)
    );
}

#[test]
fn test_anderson_memory_is_bounded() {
    let too_large = json!({"K": u64::MAX});
    assert!(matches!(
        SolverOptions::<f64>::from_json(Some(&too_large)),
        Err(SolverError::InvalidOption { key, .. }) if key == "K"
    ));
    let largest = json!({"K": MAX_ANDERSON_K});
    assert_eq!(
        SolverOptions::<f64>::from_json(Some(&largest)).unwrap().get_K(),
        MAX_ANDERSON_K
    );

    // options built in code are checked by the backend
    let mut qp = QuadraticProgram::<f64>::zeros(2);
    qp.P = Array2::eye(2);
    let options = SolverOptions::default().K(usize::MAX);
    assert!(matches!(
        CoordinateDescent.solve(&qp, &options, None),
        Err(SolverError::InvalidOption { key, .. }) if key == "K"
    ));
}

#[test]
fn test_cd_epoch_diagonal() {
    let mut qp = QuadraticProgram::zeros(2);
    qp.P = array![[2., 0.], [0., 4.]];
    qp.q = array![-2., -4.];
    let mut w = Array1::zeros(2);
    let mut Pw = Array1::zeros(2);
    cd_epoch(&qp, &mut w, &mut Pw);
    assert_array_all_close(w.view(), array![1., 1.].view(), 1e-12);
    assert_array_all_close(Pw.view(), array![2., 4.].view(), 1e-12);
}

#[test]
fn test_backends_solve_ridge() {
    let (X, y) = generate_random_data(30, 8);
    let qp = regression_qp(&X, &y, 0., 0.1);
    let true_w = solve_lin_sys(qp.P.view(), (-&qp.q).view()).unwrap();

    for &name in installed_solvers() {
        let backend = solver_backend::<f64>(Some(name)).unwrap();
        let solution = backend.solve(&qp, &SolverOptions::default(), None).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_array_all_close(solution.w.unwrap().view(), true_w.view(), 1e-7);
    }
}

#[test]
fn test_backends_agree_on_lasso() {
    let (X, y) = generate_random_data(20, 10);
    let qp = regression_qp(&X, &y, 0.5, 0.);

    let cd = CoordinateDescent.solve(&qp, &SolverOptions::default(), None).unwrap();
    let fista_options = SolverOptions::default().max_iter(100_000).tol(1e-9);
    let fista = Fista.solve(&qp, &fista_options, None).unwrap();
    assert_eq!(cd.status, SolveStatus::Optimal);
    assert!(fista.status.is_solved());

    let w_cd = cd.w.unwrap();
    assert_array_all_close(w_cd.view(), fista.w.unwrap().view(), 1e-5);
    // alpha is large enough to zero out some coefficients
    assert!(w_cd.iter().any(|&wj| wj == 0.));

    let Pw = qp.P.dot(&w_cd);
    let (_, violation) = qp.optimality_violation(w_cd.view(), Pw.view());
    assert!(violation < 1e-9);
}

#[test]
fn test_cd_without_acceleration() {
    let (X, y) = generate_random_data(20, 5);
    let qp = regression_qp(&X, &y, 0.05, 0.);
    let accelerated = CoordinateDescent
        .solve(&qp, &SolverOptions::default(), None)
        .unwrap();
    let plain = CoordinateDescent
        .solve(&qp, &SolverOptions::default().use_acceleration(false), None)
        .unwrap();
    assert_array_all_close(
        accelerated.w.unwrap().view(),
        plain.w.unwrap().view(),
        1e-8,
    );
}

#[test]
fn test_bounds_are_respected() {
    let mut qp = QuadraticProgram::zeros(2);
    qp.P = Array2::eye(2);
    qp.q = array![1., -1.];
    qp.lower = Array1::zeros(2);

    for &name in installed_solvers() {
        let backend = solver_backend::<f64>(Some(name)).unwrap();
        let solution = backend.solve(&qp, &SolverOptions::default(), None).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_array_all_close(solution.w.unwrap().view(), array![0., 1.].view(), 1e-10);
        assert!((solution.objective.unwrap() + 0.5).abs() < 1e-10);
    }
}

#[test]
fn test_infeasible_bounds() {
    let mut qp = QuadraticProgram::<f64>::zeros(2);
    qp.P = Array2::eye(2);
    qp.lower = array![0., 1.];
    qp.upper = array![1., 0.];
    assert!(qp.is_infeasible());

    let solution = CoordinateDescent.solve(&qp, &SolverOptions::default(), None).unwrap();
    assert_eq!(solution.status, SolveStatus::Infeasible);
    assert!(solution.w.is_none());
    assert!(!solution.status.is_solved());
}

#[test]
fn test_zero_curvature_coordinates() {
    let mut qp = QuadraticProgram::<f64>::zeros(2);
    qp.P = array![[1., 0.], [0., 0.]];
    qp.q = array![-1., 1.];
    assert_eq!(qp.unbounded_coordinate(), Some(1));
    for &name in installed_solvers() {
        let backend = solver_backend::<f64>(Some(name)).unwrap();
        let solution = backend.solve(&qp, &SolverOptions::default(), None).unwrap();
        assert_eq!(solution.status, SolveStatus::Unbounded);
    }

    // the linear coordinate is pushed against its finite bound
    qp.lower = array![f64::NEG_INFINITY, -2.];
    assert_eq!(qp.unbounded_coordinate(), None);
    let solution = CoordinateDescent.solve(&qp, &SolverOptions::default(), None).unwrap();
    assert_array_all_close(solution.w.unwrap().view(), array![1., -2.].view(), 1e-12);

    // a large enough L1 weight keeps it at zero
    qp.lower = array![f64::NEG_INFINITY, f64::NEG_INFINITY];
    qp.l1 = array![0., 2.];
    let solution = CoordinateDescent.solve(&qp, &SolverOptions::default(), None).unwrap();
    assert_array_all_close(solution.w.unwrap().view(), array![1., 0.].view(), 1e-12);
}

#[test]
fn test_singular_curvature_unbounded() {
    // (w_0 + w_1)^2 + w_0 - w_1 decreases without bound along (-1, 1)
    let mut qp = QuadraticProgram::<f64>::zeros(2);
    qp.P = array![[2., 2.], [2., 2.]];
    qp.q = array![1., -1.];
    assert_eq!(qp.unbounded_coordinate(), None);
    assert!(qp.is_unbounded_along(array![0., 0.].view(), array![-3., 3.].view()));
    assert!(!qp.is_unbounded_along(array![0., 0.].view(), array![3., -3.].view()));
    assert!(!qp.is_unbounded_along(array![0., 0.].view(), array![1., 1.].view()));

    let options = SolverOptions::default().max_iter(1000);
    for &name in installed_solvers() {
        let backend = solver_backend::<f64>(Some(name)).unwrap();
        let solution = backend.solve(&qp, &options, None).unwrap();
        assert_eq!(solution.status, SolveStatus::Unbounded);
        assert!(solution.w.is_none());
    }
}

#[test]
fn test_singular_curvature_bounded() {
    // a lower bound on w_0 stops the drift: w_0 = -5 and w_0 + w_1 = 1/2
    let mut qp = QuadraticProgram::<f64>::zeros(2);
    qp.P = array![[2., 2.], [2., 2.]];
    qp.q = array![1., -1.];
    qp.lower = array![-5., f64::NEG_INFINITY];
    assert!(!qp.is_unbounded_along(array![0., 0.].view(), array![-5., 3.].view()));

    let solution = CoordinateDescent
        .solve(&qp, &SolverOptions::default(), None)
        .unwrap();
    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_array_all_close(solution.w.unwrap().view(), array![-5., 5.5].view(), 1e-8);

    // the linear term is in the range of P: a whole line of minimizers
    let mut qp = QuadraticProgram::<f64>::zeros(2);
    qp.P = array![[2., 2.], [2., 2.]];
    qp.q = array![-1., -1.];
    for &name in installed_solvers() {
        let backend = solver_backend::<f64>(Some(name)).unwrap();
        let solution = backend.solve(&qp, &SolverOptions::default(), None).unwrap();
        assert!(solution.status.is_solved());
        let w = solution.w.unwrap();
        assert!((w[0] + w[1] - 0.5).abs() < 1e-6);
    }
}

#[test]
fn test_warm_start_from_solution() {
    let (X, y) = generate_random_data(15, 4);
    let qp = regression_qp(&X, &y, 0., 0.5);
    let cold = CoordinateDescent.solve(&qp, &SolverOptions::default(), None).unwrap();
    let w = cold.w.unwrap();
    let warm = CoordinateDescent
        .solve(&qp, &SolverOptions::default(), Some(w.view()))
        .unwrap();
    assert_eq!(warm.iterations, 1);
    assert!(warm.iterations <= cold.iterations);

    // a warm start of the wrong size is ignored
    let ignored = CoordinateDescent
        .solve(&qp, &SolverOptions::default(), Some(array![1., 2.].view()))
        .unwrap();
    assert_eq!(ignored.status, SolveStatus::Optimal);
}

#[test]
fn test_iteration_budget_exhausted() {
    let mut qp = QuadraticProgram::zeros(2);
    qp.P = array![[1., 0.9], [0.9, 1.]];
    qp.q = array![-1., 0.5];
    let options = SolverOptions::default().max_iter(1).use_acceleration(false);
    for &name in installed_solvers() {
        let backend = solver_backend::<f64>(Some(name)).unwrap();
        let solution = backend.solve(&qp, &options, None).unwrap();
        assert_eq!(solution.status, SolveStatus::OptimalInaccurate);
        assert!(solution.status.is_solved());
        assert_eq!(solution.iterations, 1);
    }
}

#[test]
fn test_gershgorin_bound() {
    let mut qp = QuadraticProgram::<f64>::zeros(2);
    assert_eq!(gershgorin_bound(&qp), 1.);
    qp.P = array![[2., -1.], [-1., 3.]];
    assert_eq!(gershgorin_bound(&qp), 4.);
}

#[test]
fn test_objective_value() {
    let mut qp = QuadraticProgram::zeros(2);
    qp.P = Array2::eye(2) * 2.;
    qp.q = array![1., 0.];
    qp.r = 3.;
    qp.l1 = array![0.5, 0.5];
    let w = array![1., -2.];
    let Pw = qp.P.dot(&w);
    // 0.5 * 10 + 1 + 3 + 1.5
    assert_eq!(qp.objective(w.view(), Pw.view()), 10.5);
}
