//! Headless view-models of the demo screens.
//!
//! Each screen owns a [`Client`](crate::Client) and exposes one [`Status`] per region.
//! The `async` operations update the regions as they progress; none of them retries on its own.

mod post_board;
mod profile_chain;
mod status;
mod user_directory;

pub use post_board::*;
pub use profile_chain::*;
pub use status::*;
pub use user_directory::*;
