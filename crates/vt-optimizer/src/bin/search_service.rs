use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use tracing_subscriber::EnvFilter;

use vt_optimizer::{search_volatility_spec, SearchOptions};
use vt_types::Series;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Simulate a GARCH(1,1) demo series so the search has volatility
/// clustering to find.
fn demo_series(n: usize, seed: u64) -> Vec<f64> {
    let (omega, alpha, beta) = (0.05, 0.1, 0.85);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut h: f64 = omega / (1.0 - alpha - beta);
    let mut eps_prev = 0.0;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        h = omega + alpha * eps_prev * eps_prev + beta * h;
        let z: f64 = StandardNormal.sample(&mut rng);
        eps_prev = z * h.sqrt();
        out.push(eps_prev);
    }
    out
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let n = env_or("VOLTUNE_SERIES_LEN", 500usize);
    let seed = env_or("VOLTUNE_SEED", 42u64);
    let options = SearchOptions::new(env_or("VOLTUNE_MAX_P", 3), env_or("VOLTUNE_MAX_Q", 3))
        .with_max_o(env_or("VOLTUNE_MAX_O", 1))
        .with_max_lag(env_or("VOLTUNE_MAX_LAG", 1))
        .with_trials(env_or("VOLTUNE_TRIALS", 200))
        .with_workers(env_or("VOLTUNE_WORKERS", 5))
        .with_seed(seed);

    let series = Series::new("returns", demo_series(n, seed))?;
    let best = search_volatility_spec(series, options)?;
    println!("{}", serde_json::to_string_pretty(&best)?);
    Ok(())
}
