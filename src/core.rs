//! Chain-running machinery: thinning, progress reporting and parallel chains.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::debug;
use ndarray::{Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;

use crate::error::{GibbsError, Result};
use crate::gibbs::ChainState;

pub trait MarkovChain {
    /// Does one update of the chain, returning the new current state.
    fn step(&mut self) -> Result<&ChainState>;

    /// Gets the current state without stepping.
    fn current_state(&self) -> &ChainState;

    /// Puts the chain back at its starting state.
    fn reset(&mut self);
}

/// Allocates the `n_samples x 2` output table, reporting allocation failure as an error.
pub(crate) fn alloc_table(n_samples: usize) -> Result<Array2<f64>> {
    let len = n_samples
        .checked_mul(2)
        .filter(|&len| len <= isize::MAX as usize)
        .ok_or_else(|| {
            GibbsError::InvalidArgument(format!("{n_samples} samples do not fit in memory"))
        })?;
    let mut buf: Vec<f64> = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        GibbsError::GeneratorInit(format!("cannot allocate {n_samples} samples: {e}"))
    })?;
    buf.resize(len, 0.0);
    Array2::from_shape_vec((n_samples, 2), buf)
        .map_err(|e| GibbsError::InvalidArgument(e.to_string()))
}

/// Runs `chain` for `n_samples` retained samples, taking `thin` steps before each one.
///
/// Row `i` holds the state after `(i + 1) * thin` steps. With `thin == 0` every row is
/// the state the chain started in.
pub fn run_chain<M: MarkovChain>(
    chain: &mut M,
    n_samples: usize,
    thin: usize,
) -> Result<Array2<f64>> {
    let mut out = alloc_table(n_samples)?;
    for mut row in out.rows_mut() {
        for _ in 0..thin {
            chain.step()?;
        }
        let state = chain.current_state();
        row[0] = state.x;
        row[1] = state.y;
    }
    Ok(out)
}

pub fn run_chain_with_progress<M: MarkovChain>(
    chain: &mut M,
    n_samples: usize,
    thin: usize,
    pb: &ProgressBar,
) -> Result<Array2<f64>> {
    let mut out = alloc_table(n_samples)?;
    pb.set_length(n_samples as u64);

    for mut row in out.rows_mut() {
        for _ in 0..thin {
            chain.step()?;
        }
        let state = chain.current_state();
        row[0] = state.x;
        row[1] = state.y;

        pb.inc(1);
    }

    Ok(out)
}

/// A trait for "anything that owns multiple MarkovChains".
pub trait HasChains {
    type Chain: MarkovChain + Send;

    /// Returns a mutable reference to the vector of chains.
    fn chains_mut(&mut self) -> &mut Vec<Self::Chain>;
}

fn stack_chains(tables: &[Array2<f64>]) -> Result<Array3<f64>> {
    if tables.is_empty() {
        return Err(GibbsError::InvalidArgument(
            "at least one chain is required".into(),
        ));
    }
    let views: Vec<ArrayView2<f64>> = tables.iter().map(|t| t.view()).collect();
    ndarray::stack(Axis(0), &views).map_err(|e| GibbsError::InvalidArgument(e.to_string()))
}

pub trait ChainRunner: HasChains {
    /// Runs the chains in parallel and returns draws shaped `(chain, sample, [x, y])`.
    ///
    /// Every chain is reset before it runs. If any chain fails the whole run fails.
    fn run(&mut self, n_samples: usize, thin: usize) -> Result<Array3<f64>> {
        let chains = self.chains_mut();
        debug!(
            "Running {} chains for {n_samples} samples with thin = {thin}",
            chains.len()
        );
        let tables = chains
            .par_iter_mut()
            .map(|chain| {
                chain.reset();
                run_chain(chain, n_samples, thin)
            })
            .collect::<Result<Vec<_>>>()?;
        stack_chains(&tables)
    }

    fn run_with_progress(&mut self, n_samples: usize, thin: usize) -> Result<Array3<f64>> {
        let multi = MultiProgress::new();
        let pb_style = ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");

        let tables = self
            .chains_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(i, chain)| {
                let pb = multi.add(ProgressBar::new(n_samples as u64));
                pb.set_prefix(format!("Chain {i}"));
                pb.set_style(pb_style.clone());

                chain.reset();
                let samples = run_chain_with_progress(chain, n_samples, thin, &pb);
                match &samples {
                    Ok(_) => pb.finish_with_message("Done!"),
                    Err(e) => pb.abandon_with_message(e.to_string()),
                }
                samples
            })
            .collect::<Result<Vec<_>>>()?;

        stack_chains(&tables)
    }
}

impl<T: HasChains> ChainRunner for T {}
