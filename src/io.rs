/*!
# Saving Gibbs draws to CSV

Enabled via the `csv` feature.
*/

use csv::Writer;
use ndarray::{ArrayView3, Axis};
use std::fs::File;
use std::path::Path;

use crate::error::{GibbsError, Result};

/**
Saves draws shaped `(chain, sample, [x, y])` as a CSV file.

The file starts with the header `chain,sample,x,y`, followed by one row per
sample of every chain, chains in order.

# Examples

```rust
use bivariate_gibbs::config::SamplerConfig;
use bivariate_gibbs::core::ChainRunner;
use bivariate_gibbs::io::save_csv;

let mut sampler = SamplerConfig::default().seed(1).chains(2).build_parallel()?;
let draws = sampler.run(10, 5)?;
save_csv(draws.view(), "/tmp/gibbs_draws.csv")?;
# Ok::<(), bivariate_gibbs::error::GibbsError>(())
```
*/
pub fn save_csv<P: AsRef<Path>>(draws: ArrayView3<f64>, path: P) -> Result<()> {
    let (_, _, n_cols) = draws.dim();
    if n_cols != 2 {
        return Err(GibbsError::InvalidArgument(format!(
            "expected 2 columns (x, y), got {n_cols}"
        )));
    }
    let mut wtr = Writer::from_writer(File::create(path)?);
    wtr.write_record(["chain", "sample", "x", "y"])?;

    for (chain_idx, chain) in draws.axis_iter(Axis(0)).enumerate() {
        for (sample_idx, sample) in chain.axis_iter(Axis(0)).enumerate() {
            wtr.write_record([
                chain_idx.to_string(),
                sample_idx.to_string(),
                sample[0].to_string(),
                sample[1].to_string(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
