use std::time::Instant;

use shared::{
    info,
    Result,
};

fn main() -> Result<()> {
    let start = Instant::now();
    mixtape::cli::run()?;
    info!("Finished in {:.3?}", start.elapsed());
    Ok(())
}
