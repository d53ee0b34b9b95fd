//! Runs four bivariate Gibbs chains on every backend and prints posterior summaries.

use bivariate_gibbs::config::{Backend, SamplerConfig};
use bivariate_gibbs::core::ChainRunner;
use bivariate_gibbs::stats::{rhat, summarize};
use ndarray::Axis;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    const N_CHAINS: usize = 4;
    const N_SAMPLES: usize = 5_000;
    const THIN: usize = 20;
    const SEED: u64 = 42;

    env_logger::init();

    for backend in Backend::ALL {
        let mut sampler = SamplerConfig::default()
            .backend(backend)
            .seed(SEED)
            .chains(N_CHAINS)
            .build_parallel()?;

        let draws = sampler.run_with_progress(N_SAMPLES, THIN)?;
        let pooled = draws
            .to_shape((N_CHAINS * N_SAMPLES, 2))?
            .to_owned();
        let summary = summarize(pooled.view())?;
        let r_hat = rhat(draws.view())?;

        println!("{backend:?}");
        println!(
            "  x: mean {:.4}, sd {:.4}, R-hat {:.4}",
            summary[0].mean, summary[0].sd, r_hat[0]
        );
        println!(
            "  y: mean {:.4}, sd {:.4}, R-hat {:.4}",
            summary[1].mean, summary[1].sd, r_hat[1]
        );
        let last = draws.index_axis(Axis(1), N_SAMPLES - 1);
        println!("  last draws per chain: {last}");

        #[cfg(feature = "csv")]
        {
            let filename = format!("gibbs_{backend:?}.csv").to_lowercase();
            bivariate_gibbs::io::save_csv(draws.view(), &filename)?;
            println!("  saved draws to {filename}");
        }
    }

    Ok(())
}
