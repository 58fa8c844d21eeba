//! The configuration of the preview, given from environment variables and lazy
//! initialized when needed.

use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;

use once_cell::race::OnceNonZeroUsize;
use once_cell::sync::OnceCell;
use tracing::warn;


/// The world seed.
///
/// Set `BIOMEGEN_SEED` to any 64 bits signed integer, defaults to 0.
pub fn seed() -> i64 {
    static ENV: OnceCell<i64> = OnceCell::new();
    *ENV.get_or_init(|| parse_var("BIOMEGEN_SEED").unwrap_or(0))
}

/// Radius, in regions, of the square classified around the origin.
///
/// Set `BIOMEGEN_RADIUS`, defaults to 4 (a 128x128 blocks square).
pub fn radius() -> usize {
    static ENV: OnceNonZeroUsize = OnceNonZeroUsize::new();
    ENV.get_or_init(|| non_zero("BIOMEGEN_RADIUS", 4)).get()
}

/// Number of classification worker threads.
///
/// Set `BIOMEGEN_WORKERS`, defaults to the available parallelism.
pub fn workers() -> usize {
    static ENV: OnceNonZeroUsize = OnceNonZeroUsize::new();
    ENV.get_or_init(|| {
        let default = std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(4);
        non_zero("BIOMEGEN_WORKERS", default)
    }).get()
}

/// Approximate maximum elevation given to the generator.
///
/// Set `BIOMEGEN_MAX_ELEV`, defaults to the generator's default.
pub fn max_elev() -> Option<f64> {
    static ENV: OnceCell<Option<f64>> = OnceCell::new();
    *ENV.get_or_init(|| parse_var("BIOMEGEN_MAX_ELEV"))
}

fn non_zero(name: &str, default: usize) -> NonZeroUsize {
    parse_var::<usize>(name)
        .and_then(NonZeroUsize::new)
        .or_else(|| NonZeroUsize::new(default))
        .unwrap_or(NonZeroUsize::MIN)
}

/// Parse an environment variable, a present but invalid value is reported and ignored.
fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring invalid {name}: {value:?}");
            None
        }
    }
}
