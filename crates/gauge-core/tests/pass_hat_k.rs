use gauge_core::results::binomial;
use gauge_core::{pass_hat_k, MetricsError};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn successes_one_zero_one_one() {
    // [1, 0, 1, 1]: n = 4, c = 3
    let expected = [(1, 0.75), (2, 0.5), (3, 0.25), (4, 0.0)];
    for (k, want) in expected {
        assert!(approx(pass_hat_k(4, 3, k).unwrap(), want), "pass^{k}");
    }
}

#[test]
fn equals_ratio_of_binomials() {
    for n in 1..=12u64 {
        for c in 0..=n {
            for k in 1..=n {
                let want = binomial(c, k).unwrap() as f64 / binomial(n, k).unwrap() as f64;
                assert!(approx(pass_hat_k(n, c, k).unwrap(), want), "n={n} c={c} k={k}");
            }
        }
    }
}

#[test]
fn zero_when_fewer_successes_than_k() {
    assert_eq!(pass_hat_k(10, 2, 3).unwrap(), 0.0);
    assert_eq!(pass_hat_k(1, 0, 1).unwrap(), 0.0);
}

#[test]
fn non_increasing_in_k() {
    let values: Vec<f64> = (1..=8).map(|k| pass_hat_k(8, 6, k).unwrap()).collect();
    assert!(values.windows(2).all(|w| w[1] <= w[0]));
}

#[test]
fn rejects_k_beyond_trials() {
    assert!(matches!(
        pass_hat_k(2, 2, 3),
        Err(MetricsError::KExceedsTrials { n: 2, k: 3 })
    ));
}
