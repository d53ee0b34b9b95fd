/*!
Gibbs sampler for the bivariate chain

```text
x | y ~ Gamma(shape = 3, scale = 1 / (y^2 + 4))
y | x ~ Normal(mean = 1 / (x + 1), sd = 1 / sqrt(2x + 2))
```

One update draws `x` from the current `y`, then `y` from the new `x`. The chain
starts at `(0, 0)`; since `x` is drawn first the starting `x` never feeds a
normal draw.

# Examples

```rust
use bivariate_gibbs::gibbs::GibbsSampler;
use bivariate_gibbs::source::DistrSource;

let mut sampler = GibbsSampler::new(DistrSource::seed_from_u64(42));
let draws = sampler.run(100, 10).unwrap();
assert_eq!(draws.shape(), &[100, 2]);
assert!(draws.column(0).iter().all(|&x| x >= 0.0));
```
*/

use indicatif::ProgressBar;
use log::{debug, warn};
use ndarray::Array2;

use crate::core::{run_chain, run_chain_with_progress, HasChains, MarkovChain};
use crate::error::{GibbsError, Result};
use crate::source::RandomSource;

/// Shape of the gamma conditional for `x`.
pub const GAMMA_SHAPE: f64 = 3.0;

/// Current position of the chain.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChainState {
    pub x: f64,
    pub y: f64,
}

/// Parameters `(shape, scale)` of `x | y`.
///
/// Fails for a non-finite `y`, reporting `y` itself.
pub fn x_conditional(y: f64) -> Result<(f64, f64)> {
    let rate = y * y + 4.0;
    if !rate.is_finite() {
        return Err(GibbsError::domain("gamma", "y", y));
    }
    Ok((GAMMA_SHAPE, 1.0 / rate))
}

/// Parameters `(mean, sd)` of `y | x`. Fails for `x <= -1` instead of returning NaN,
/// reporting `x` itself.
pub fn y_conditional(x: f64) -> Result<(f64, f64)> {
    let var_inv = 2.0 * x + 2.0;
    if !(var_inv.is_finite() && var_inv > 0.0) {
        return Err(GibbsError::domain("normal", "x", x));
    }
    Ok((1.0 / (x + 1.0), 1.0 / var_inv.sqrt()))
}

/// A single Gibbs chain that owns its random source.
pub struct GibbsSampler<S: RandomSource> {
    source: S,
    state: ChainState,
    seed: Option<u64>,
}

impl<S: RandomSource> GibbsSampler<S> {
    /// Creates a sampler at `(0, 0)` drawing from `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: ChainState::default(),
            seed: None,
        }
    }

    /// Records the seed `source` was built from, so it can be reported back.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn set_state(&mut self, state: ChainState) {
        self.state = state;
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Draws `n_samples` rows of `(x, y)`, doing `thin` updates before each row.
    ///
    /// Every run starts the chain at `(0, 0)`; only the random source carries over
    /// between runs. Consumes exactly `2 * n_samples * thin` variates. On error nothing
    /// is returned.
    pub fn run(&mut self, n_samples: usize, thin: usize) -> Result<Array2<f64>> {
        self.reset();
        self.resume(n_samples, thin)
    }

    /// Like [`run`](Self::run) but continues from the current state instead of `(0, 0)`.
    pub fn resume(&mut self, n_samples: usize, thin: usize) -> Result<Array2<f64>> {
        debug!(
            "Gibbs run: {n_samples} samples, thin = {thin}, start = {:?}",
            self.state
        );
        let draws = run_chain(self, n_samples, thin)?;
        debug!("Gibbs run finished at {:?}", self.state);
        Ok(draws)
    }

    /// Like [`run`](Self::run) but takes signed counts, as handed over by a foreign caller.
    pub fn run_checked(&mut self, n_samples: i64, thin: i64) -> Result<Array2<f64>> {
        let n = usize::try_from(n_samples).map_err(|_| {
            warn!("Rejecting Gibbs run with n_samples = {n_samples}");
            GibbsError::InvalidArgument(format!(
                "number of samples must be non-negative, got {n_samples}"
            ))
        })?;
        let thin = usize::try_from(thin).map_err(|_| {
            warn!("Rejecting Gibbs run with thin = {thin}");
            GibbsError::InvalidArgument(format!("thin must be non-negative, got {thin}"))
        })?;
        self.run(n, thin)
    }

    pub fn run_with_progress(
        &mut self,
        n_samples: usize,
        thin: usize,
        pb: &ProgressBar,
    ) -> Result<Array2<f64>> {
        self.reset();
        run_chain_with_progress(self, n_samples, thin, pb)
    }
}

impl<S: RandomSource> MarkovChain for GibbsSampler<S> {
    fn step(&mut self) -> Result<&ChainState> {
        let (shape, scale) = x_conditional(self.state.y)?;
        self.state.x = self.source.gamma(shape, scale)?;
        let (mean, sd) = y_conditional(self.state.x)?;
        self.state.y = self.source.normal(mean, sd)?;
        Ok(&self.state)
    }

    fn current_state(&self) -> &ChainState {
        &self.state
    }

    fn reset(&mut self) {
        self.state = ChainState::default();
    }
}

/// Independent Gibbs chains run side by side, chain `i` seeded with `seed + i`.
pub struct ParallelGibbs<S: RandomSource> {
    pub chains: Vec<GibbsSampler<S>>,
    pub seed: u64,
}

impl<S: RandomSource + Send> ParallelGibbs<S> {
    /// Builds `n_chains` chains, calling `make_source` with each chain's seed.
    pub fn from_fn<F>(n_chains: usize, seed: u64, mut make_source: F) -> Result<Self>
    where
        F: FnMut(u64) -> Result<S>,
    {
        if n_chains == 0 {
            return Err(GibbsError::InvalidArgument(
                "at least one chain is required".into(),
            ));
        }
        let chains = (0..n_chains as u64)
            .map(|i| {
                let chain_seed = seed.wrapping_add(i);
                make_source(chain_seed).map(|s| GibbsSampler::new(s).with_seed(chain_seed))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { chains, seed })
    }
}

impl<S: RandomSource + Send> HasChains for ParallelGibbs<S> {
    type Chain = GibbsSampler<S>;

    fn chains_mut(&mut self) -> &mut Vec<Self::Chain> {
        &mut self.chains
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChainRunner;
    use crate::source::tests::ScriptedRng;
    use crate::source::{DistrSource, MarsagliaTsang};
    use approx::assert_abs_diff_eq;

    /// Returns fixed values and counts calls.
    #[derive(Default)]
    struct Recording {
        gamma_value: f64,
        normal_value: f64,
        gamma_calls: Vec<(f64, f64)>,
        normal_calls: Vec<(f64, f64)>,
    }

    impl RandomSource for Recording {
        fn gamma(&mut self, shape: f64, scale: f64) -> Result<f64> {
            self.gamma_calls.push((shape, scale));
            Ok(self.gamma_value)
        }

        fn normal(&mut self, mean: f64, sd: f64) -> Result<f64> {
            self.normal_calls.push((mean, sd));
            Ok(self.normal_value)
        }
    }

    #[test]
    fn conditionals_use_scale_and_standard_deviation() {
        let (shape, scale) = x_conditional(2.0).unwrap();
        assert_eq!(shape, 3.0);
        assert_eq!(scale, 0.125);

        let (mean, sd) = y_conditional(1.0).unwrap();
        assert_eq!(mean, 0.5);
        assert_eq!(sd, 0.5);
    }

    #[test]
    fn y_conditional_rejects_x_at_or_below_minus_one() {
        for x in [-1.0, -1.5, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    y_conditional(x),
                    Err(GibbsError::NumericDomain {
                        distribution: "normal",
                        parameter: "x",
                        ..
                    })
                ),
                "x = {x} should be rejected"
            );
        }
    }

    #[test]
    fn x_conditional_rejects_non_finite_y() {
        assert!(x_conditional(f64::NAN).is_err());
        assert!(x_conditional(f64::INFINITY).is_err());
    }

    #[test]
    fn update_order_uses_old_y_then_new_x() {
        let source = Recording {
            gamma_value: 1.0,
            normal_value: 2.0,
            ..Default::default()
        };
        let mut sampler = GibbsSampler::new(source);
        let out = sampler.run(1, 2).unwrap();

        let source = sampler.source();
        // First update sees y = 0, second sees y = 2.
        assert_eq!(source.gamma_calls, vec![(3.0, 0.25), (3.0, 0.125)]);
        // Both normal draws see the freshly drawn x = 1.
        assert_eq!(source.normal_calls, vec![(0.5, 0.5), (0.5, 0.5)]);
        assert_eq!(out.row(0).to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn draw_count_is_two_per_update() {
        let source = Recording {
            gamma_value: 0.5,
            normal_value: 0.1,
            ..Default::default()
        };
        let mut sampler = GibbsSampler::new(source);
        sampler.run(7, 3).unwrap();
        assert_eq!(sampler.source().gamma_calls.len(), 21);
        assert_eq!(sampler.source().normal_calls.len(), 21);
    }

    #[test]
    fn run_returns_requested_rows() {
        let mut sampler = GibbsSampler::new(DistrSource::seed_from_u64(1));
        for (n, thin) in [(0, 0), (0, 5), (1, 1), (17, 0), (50, 3)] {
            let out = sampler.run(n, thin).unwrap();
            assert_eq!(out.shape(), &[n, 2]);
        }
    }

    #[test]
    fn zero_thin_returns_initial_state() {
        let mut sampler = GibbsSampler::new(Recording::default());
        let out = sampler.run(4, 0).unwrap();
        assert!(out.iter().all(|&v| v == 0.0));
        assert!(sampler.source().gamma_calls.is_empty());
        assert!(sampler.source().normal_calls.is_empty());
    }

    #[test]
    fn second_run_restarts_at_origin() {
        let mut sampler = GibbsSampler::new(DistrSource::seed_from_u64(8));
        let first = sampler.run(5, 3).unwrap();
        assert!(first.iter().any(|&v| v != 0.0));
        let second = sampler.run(3, 0).unwrap();
        assert!(second.iter().all(|&v| v == 0.0));

        let pb = ProgressBar::hidden();
        sampler.run(2, 4).unwrap();
        let out = sampler.run_with_progress(2, 0, &pb).unwrap();
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn resume_continues_from_current_state() {
        let mut sampler = GibbsSampler::new(Recording {
            gamma_value: 2.0,
            normal_value: -0.5,
            ..Default::default()
        });
        sampler.run(1, 1).unwrap();
        let out = sampler.resume(2, 0).unwrap();
        assert_eq!(out.row(0).to_vec(), vec![2.0, -0.5]);
        assert_eq!(out.row(1).to_vec(), vec![2.0, -0.5]);
    }

    #[test]
    fn one_update_matches_hand_computed_reference() {
        // gamma: Box-Muller from (u1, u2) = (0.5, 0), accepted with u = 0.25
        // normal: Box-Muller from (u1, u2) = (0.25, 0.5)
        let rng = ScriptedRng::new(&[0.5, 0.0, 0.75, 0.75, 0.5]);
        let mut sampler = GibbsSampler::new(MarsagliaTsang::new(rng));
        let out = sampler.run(1, 1).unwrap();

        let d: f64 = 3.0 - 1.0 / 3.0;
        let z = (2.0 * 2f64.ln()).sqrt();
        let v = (1.0 + z / (9.0 * d).sqrt()).powi(3);
        let x = d * v * 0.25;
        let y = 1.0 / (x + 1.0) - (4.0 * 2f64.ln()).sqrt() / (2.0 * x + 2.0).sqrt();

        assert_abs_diff_eq!(out[[0, 0]], x, epsilon = 1e-12);
        assert_abs_diff_eq!(out[[0, 1]], y, epsilon = 1e-12);
        assert_abs_diff_eq!(out[[0, 0]], 1.2721217966523133, epsilon = 1e-12);
        assert_abs_diff_eq!(out[[0, 1]], -0.34099225682949674, epsilon = 1e-12);
    }

    #[test]
    fn same_seed_is_bitwise_reproducible() {
        let a = GibbsSampler::new(DistrSource::seed_from_u64(2024))
            .run(200, 5)
            .unwrap();
        let b = GibbsSampler::new(DistrSource::seed_from_u64(2024))
            .run(200, 5)
            .unwrap();
        assert_eq!(a, b);

        let c = GibbsSampler::new(DistrSource::seed_from_u64(2025))
            .run(200, 5)
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn long_thinning_stays_finite_and_non_negative() {
        let mut sampler = GibbsSampler::new(MarsagliaTsang::seed_from_u64(5));
        let out = sampler.run(5, 10_000).unwrap();
        assert!(out.column(0).iter().all(|&x| x.is_finite() && x >= 0.0));
        assert!(out.column(1).iter().all(|&y| y.is_finite()));
    }

    #[test]
    fn corrupted_y_fails_the_run() {
        let mut sampler = GibbsSampler::new(DistrSource::seed_from_u64(3));
        sampler.set_state(ChainState { x: 0.0, y: f64::NAN });
        let result = sampler.resume(3, 2);
        assert!(matches!(
            result,
            Err(GibbsError::NumericDomain {
                distribution: "gamma",
                parameter: "y",
                value,
            }) if value.is_nan()
        ));
    }

    #[test]
    fn negative_x_from_source_is_a_domain_error() {
        let source = Recording {
            gamma_value: -1.5,
            normal_value: 0.0,
            ..Default::default()
        };
        let mut sampler = GibbsSampler::new(source);
        let result = sampler.run(2, 1);
        assert!(matches!(
            result,
            Err(GibbsError::NumericDomain {
                distribution: "normal",
                parameter: "x",
                value,
            }) if value == -1.5
        ));
        assert!(sampler.source().normal_calls.is_empty());
    }

    #[test]
    fn run_checked_rejects_negative_counts() {
        let mut sampler = GibbsSampler::new(Recording::default());
        assert!(matches!(
            sampler.run_checked(-1, 1),
            Err(GibbsError::InvalidArgument(_))
        ));
        assert!(matches!(
            sampler.run_checked(1, -1),
            Err(GibbsError::InvalidArgument(_))
        ));
        assert!(sampler.source().gamma_calls.is_empty());
        assert_eq!(sampler.run_checked(3, 0).unwrap().nrows(), 3);
    }

    #[test]
    fn parallel_chains_get_consecutive_seeds() {
        let sampler =
            ParallelGibbs::from_fn(3, 10, |s| Ok(DistrSource::seed_from_u64(s))).unwrap();
        let seeds: Vec<_> = sampler.chains.iter().map(|c| c.seed()).collect();
        assert_eq!(seeds, vec![Some(10), Some(11), Some(12)]);
    }

    #[test]
    fn parallel_chain_matches_single_chain_with_same_seed() {
        let mut parallel =
            ParallelGibbs::from_fn(2, 77, |s| Ok(DistrSource::seed_from_u64(s))).unwrap();
        let draws = parallel.run(50, 4).unwrap();
        let single = GibbsSampler::new(DistrSource::seed_from_u64(78))
            .run(50, 4)
            .unwrap();
        assert_eq!(draws.index_axis(ndarray::Axis(0), 1), single);
    }

    #[test]
    fn zero_chains_is_invalid() {
        let result = ParallelGibbs::from_fn(0, 1, |s| Ok(DistrSource::seed_from_u64(s)));
        assert!(matches!(result, Err(GibbsError::InvalidArgument(_))));
    }
}
