/*!
Random-variate sources for the Gibbs sampler.

The sampler only needs two things from a generator: gamma variates in the
shape/scale convention and normal variates parameterised by mean and
standard deviation. [`RandomSource`] captures exactly that, and the three
adapters in this module implement it on top of any [`rand::Rng`] engine:

- [`DistrSource`] builds a parameterised `rand_distr` distribution for every draw.
- [`ScaledSource`] keeps a prebuilt standard gamma generator and rescales its output.
- [`MarsagliaTsang`] implements Marsaglia-Tsang (gamma) and Box-Muller (normal)
  directly on raw uniforms, so its trace can be reproduced outside this crate.

All three draw from the same distributions. Only the two `rand_distr`-based
sources share an algorithm, so a trace recorded on one backend should only be
compared against the same backend.

# Examples

```rust
use bivariate_gibbs::source::{DistrSource, RandomSource};

let mut source = DistrSource::seed_from_u64(42);
let x = source.gamma(3.0, 0.25).unwrap();
let y = source.normal(1.0 / (x + 1.0), 1.0 / (2.0 * x + 2.0).sqrt()).unwrap();
assert!(x >= 0.0 && y.is_finite());
```
*/

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Gamma, Normal, StandardNormal};
use std::f64::consts::PI;

use crate::error::{GibbsError, Result};

/// A generator of gamma and normal variates.
pub trait RandomSource {
    /// Draws from Gamma(`shape`, `scale`), where `scale` is the inverse rate.
    fn gamma(&mut self, shape: f64, scale: f64) -> Result<f64>;

    /// Draws from Normal(`mean`, `sd`), where `sd` is a standard deviation.
    fn normal(&mut self, mean: f64, sd: f64) -> Result<f64>;
}

impl<S: RandomSource + ?Sized> RandomSource for Box<S> {
    fn gamma(&mut self, shape: f64, scale: f64) -> Result<f64> {
        (**self).gamma(shape, scale)
    }

    fn normal(&mut self, mean: f64, sd: f64) -> Result<f64> {
        (**self).normal(mean, sd)
    }
}

fn check_gamma(shape: f64, scale: f64) -> Result<()> {
    if !(shape.is_finite() && shape > 0.0) {
        return Err(GibbsError::domain("gamma", "shape", shape));
    }
    if !(scale.is_finite() && scale > 0.0) {
        return Err(GibbsError::domain("gamma", "scale", scale));
    }
    Ok(())
}

fn check_normal(mean: f64, sd: f64) -> Result<()> {
    if !mean.is_finite() {
        return Err(GibbsError::domain("normal", "mean", mean));
    }
    if !(sd.is_finite() && sd > 0.0) {
        return Err(GibbsError::domain("normal", "sd", sd));
    }
    Ok(())
}

/// Draws through `rand_distr`'s parameterised [`Gamma`] and [`Normal`].
#[derive(Clone, Debug)]
pub struct DistrSource<R: Rng> {
    rng: R,
}

impl<R: Rng> DistrSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl DistrSource<SmallRng> {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for DistrSource<R> {
    fn gamma(&mut self, shape: f64, scale: f64) -> Result<f64> {
        check_gamma(shape, scale)?;
        let gamma =
            Gamma::new(shape, scale).map_err(|_| GibbsError::domain("gamma", "scale", scale))?;
        Ok(gamma.sample(&mut self.rng))
    }

    fn normal(&mut self, mean: f64, sd: f64) -> Result<f64> {
        check_normal(mean, sd)?;
        let normal =
            Normal::new(mean, sd).map_err(|_| GibbsError::domain("normal", "sd", sd))?;
        Ok(normal.sample(&mut self.rng))
    }
}

/**
Draws standard variates and moves them into place.

A unit-scale gamma generator for a fixed shape is built up front; each gamma
draw is multiplied by the requested scale, and each normal draw is
`mean + sd * z` with `z ~ N(0, 1)`. Asking for a different shape rebuilds the
standard generator.
*/
#[derive(Clone, Debug)]
pub struct ScaledSource<R: Rng> {
    rng: R,
    shape: f64,
    standard_gamma: Gamma<f64>,
}

impl<R: Rng> ScaledSource<R> {
    /// Creates a source whose standard gamma generator has the given `shape`.
    pub fn new(rng: R, shape: f64) -> Result<Self> {
        let standard_gamma = Gamma::new(shape, 1.0).map_err(|e| {
            GibbsError::GeneratorInit(format!("standard gamma with shape {shape}: {e}"))
        })?;
        Ok(Self {
            rng,
            shape,
            standard_gamma,
        })
    }

    pub fn shape(&self) -> f64 {
        self.shape
    }
}

impl ScaledSource<SmallRng> {
    pub fn seed_from_u64(seed: u64, shape: f64) -> Result<Self> {
        Self::new(SmallRng::seed_from_u64(seed), shape)
    }
}

impl<R: Rng> RandomSource for ScaledSource<R> {
    fn gamma(&mut self, shape: f64, scale: f64) -> Result<f64> {
        check_gamma(shape, scale)?;
        if shape != self.shape {
            self.standard_gamma =
                Gamma::new(shape, 1.0).map_err(|_| GibbsError::domain("gamma", "shape", shape))?;
            self.shape = shape;
        }
        Ok(self.standard_gamma.sample(&mut self.rng) * scale)
    }

    fn normal(&mut self, mean: f64, sd: f64) -> Result<f64> {
        check_normal(mean, sd)?;
        let z: f64 = self.rng.sample(StandardNormal);
        Ok(mean + sd * z)
    }
}

/**
Marsaglia-Tsang gamma and Box-Muller normal variates on raw uniforms.

Every uniform `u` is taken from the engine as `rng.gen::<f64>()` in `[0, 1)`;
wherever a logarithm or root is needed `1 - u` is used instead so the
argument lies in `(0, 1]`.

- Normal: `z = sqrt(-2 ln(1 - u1)) * cos(2 pi u2)`, two uniforms per draw, the
  sine branch is discarded.
- Gamma, shape `a >= 1`: with `d = a - 1/3` and `c = 1 / sqrt(9 d)`, draw a
  standard normal `z`, set `v = (1 + c z)^3` (retry if `1 + c z <= 0`), draw
  `u`, accept `d v` if `ln(1 - u) < z^2 / 2 + d - d v + d ln v`, otherwise retry.
- Gamma, shape `a < 1`: draw `g` with shape `a + 1` and return
  `g * (1 - u)^(1 / a)`.

The result is multiplied by `scale`.
*/
#[derive(Clone, Debug)]
pub struct MarsagliaTsang<R: Rng> {
    rng: R,
}

impl<R: Rng> MarsagliaTsang<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn standard_normal(&mut self) -> f64 {
        let u1 = 1.0 - self.uniform();
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    fn standard_gamma(&mut self, shape: f64) -> f64 {
        if shape < 1.0 {
            let g = self.standard_gamma(shape + 1.0);
            let u = 1.0 - self.uniform();
            return g * u.powf(1.0 / shape);
        }
        let d = shape - 1.0 / 3.0;
        let c = 1.0 / (9.0 * d).sqrt();
        loop {
            let z = self.standard_normal();
            let t = 1.0 + c * z;
            if t <= 0.0 {
                continue;
            }
            let v = t * t * t;
            let u = 1.0 - self.uniform();
            if u.ln() < 0.5 * z * z + d - d * v + d * v.ln() {
                return d * v;
            }
        }
    }
}

impl MarsagliaTsang<SmallRng> {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for MarsagliaTsang<R> {
    fn gamma(&mut self, shape: f64, scale: f64) -> Result<f64> {
        check_gamma(shape, scale)?;
        Ok(self.standard_gamma(shape) * scale)
    }

    fn normal(&mut self, mean: f64, sd: f64) -> Result<f64> {
        check_normal(mean, sd)?;
        Ok(mean + sd * self.standard_normal())
    }
}
