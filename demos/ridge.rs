extern crate cvxlm;

use cvxlm::{
    datasets::DatasetBase,
    estimators::{Fit, Lasso, Predict, Ridge},
    helpers::test_helpers::generate_random_data,
};

fn main() {
    env_logger::init();

    let (x, y) = generate_random_data(30, 10);
    let dataset = DatasetBase::from((x.clone(), y));

    let mut ridge = Ridge::params().eta(0.01).fit_intercept(true).build().unwrap();
    ridge.fit(&dataset).unwrap();
    println!("ridge coefficients: {}", ridge.coefficients().unwrap());
    println!("ridge intercept: {}", ridge.intercept().unwrap());

    let mut lasso = Lasso::params().alpha(0.1).solver("FISTA").build().unwrap();
    lasso.fit(&dataset).unwrap();
    let n_zeros = lasso
        .coefficients()
        .unwrap()
        .iter()
        .filter(|&&c| c == 0.)
        .count();
    println!("lasso zeroed {} coefficients out of {}", n_zeros, x.ncols());

    let predictions = ridge.predict(x.view()).unwrap();
    println!("first prediction: {}", predictions[0]);
}
