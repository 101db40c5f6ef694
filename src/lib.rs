pub mod builder;
pub mod cli;
pub mod layer;
pub mod reconcile;
pub mod remap;
pub mod scene;
pub mod store;
pub mod transfer;

mod multimap;

#[cfg(test)]
mod fixtures;
