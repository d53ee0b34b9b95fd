//! Summaries and convergence diagnostics for Gibbs draws.

use ndarray::prelude::*;
use ndarray_stats::QuantileExt;

use crate::error::{GibbsError, Result};

/// Mean and standard deviation of one column of draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub sd: f64,
}

/// Per-column [`Summary`] of an `(n_samples, n_params)` table.
pub fn summarize(draws: ArrayView2<f64>) -> Result<Vec<Summary>> {
    if draws.nrows() < 2 {
        return Err(GibbsError::InvalidArgument(format!(
            "need at least 2 samples to summarize, got {}",
            draws.nrows()
        )));
    }
    Ok(draws
        .axis_iter(Axis(1))
        .map(|col| Summary {
            mean: col.mean().unwrap_or(f64::NAN),
            sd: col.std(1.0),
        })
        .collect())
}

/**
Potential scale reduction factor R-hat for each parameter.

`draws` is shaped `(n_chains, n_samples, n_params)`. With `n` samples per chain,
`W` the mean within-chain variance and `B` the between-chain variance of the
chain means scaled by `n`,

```text
R-hat = sqrt(((n - 1) / n * W + B / n) / W)
```

Values close to 1 mean the chains agree. R-hat is undefined, and an error, when
`W` is zero for some parameter, i.e. every chain is constant in it.
*/
pub fn rhat(draws: ArrayView3<f64>) -> Result<Array1<f64>> {
    let (n_chains, n_samples, _) = draws.dim();
    if n_chains < 2 || n_samples < 2 {
        return Err(GibbsError::InvalidArgument(format!(
            "R-hat needs at least 2 chains of 2 samples, got {n_chains} chains of {n_samples}"
        )));
    }
    let n = n_samples as f64;

    // (n_chains, n_params)
    let chain_means = draws.mean_axis(Axis(1)).ok_or_else(|| {
        GibbsError::InvalidArgument("mean over samples failed".into())
    })?;
    let chain_vars = draws.var_axis(Axis(1), 1.0);

    let within = chain_vars.mean_axis(Axis(0)).ok_or_else(|| {
        GibbsError::InvalidArgument("mean over chains failed".into())
    })?;
    if let Some(i) = within.iter().position(|&w| !(w > 0.0)) {
        return Err(GibbsError::InvalidArgument(format!(
            "R-hat is undefined: within-chain variance of parameter {i} is {}",
            within[i]
        )));
    }
    let between = chain_means.var_axis(Axis(0), 1.0) * n;

    let var = &within * ((n - 1.0) / n) + &between / n;
    Ok((var / &within).mapv(f64::sqrt))
}

/// Largest R-hat over all parameters.
pub fn max_rhat(draws: ArrayView3<f64>) -> Result<f64> {
    let all = rhat(draws)?;
    all.max()
        .copied()
        .map_err(|e| GibbsError::InvalidArgument(format!("R-hat maximum: {e}")))
}
