//! Queue service backends

mod memory;

#[cfg(test)]
mod tests;

pub use memory::{InMemoryQueueService, Operation};
