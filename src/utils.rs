mod latest;
pub mod sync;
pub mod timer;

pub use latest::*;

#[cfg(test)]
pub mod test_helpers;
