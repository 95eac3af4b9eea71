extern crate cvxlm;

use std::rc::Rc;

use cvxlm::{
    datasets::DatasetBase,
    estimators::{Fit, HyperValue, Ridge},
    helpers::test_helpers::generate_random_data,
};

fn main() {
    env_logger::init();

    let (x, y) = generate_random_data(50, 20);
    let dataset = DatasetBase::from((x, y));

    let mut estimator = Ridge::params().eta(1.).warm_start(true).build().unwrap();
    estimator.fit(&dataset).unwrap();
    let canonicals = Rc::clone(estimator.canonicals().unwrap());

    // Only the live `eta` parameter changes along the path.
    for eta in [1., 0.1, 0.01, 0.001] {
        estimator.set_param("eta", HyperValue::Real(eta)).unwrap();
        estimator.fit(&dataset).unwrap();
        let coefficients = estimator.coefficients().unwrap();
        println!(
            "eta = {:>6}: ||beta|| = {:.6}",
            eta,
            coefficients.dot(&coefficients).sqrt()
        );
    }
    assert!(Rc::ptr_eq(&canonicals, estimator.canonicals().unwrap()));
}
