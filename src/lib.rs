//! A mock backend, a simulated network in front of it, and a tagged query cache,
//! composed into the headless screens of a state-management demo.

mod cache;
mod client;
mod config;
mod error;
mod fixture;
mod model;
mod network;
mod registry;

pub mod screens;
pub mod utils;

pub use cache::*;
pub use client::*;
pub use self::config::*;
pub use error::*;
pub use fixture::*;
pub use model::*;
pub use network::*;
pub use registry::*;
pub use screens::{Profile, Status};
