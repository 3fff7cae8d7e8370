//! The thirteen transformations, one module per operation.

pub mod build;
pub mod compose;
pub mod cross;
pub mod deduplicate;
pub mod filter;
pub mod induce;
pub mod mapreduce;
pub mod merge;
pub mod mutate;
pub mod postpone;
pub mod split;
pub mod stretch;

pub use build::{built, fabricated};
pub use compose::composed;
pub use cross::crossed;
pub use deduplicate::deduplicated;
pub use filter::filtered;
pub use induce::induced;
pub use mapreduce::mapreduced;
pub use merge::merged;
pub use mutate::mutated;
pub use postpone::postponed;
pub use split::split as split_vertices;
pub use stretch::stretched;
