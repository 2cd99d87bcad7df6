pub mod rng;
pub mod selector;
pub mod sequence;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod integration_tests;

mod layer;

mod state;

pub use layer::Layer;
pub use rng::{DrawRng, RngSecret};
pub use state::{Memory, PrepareError, State, Status};
