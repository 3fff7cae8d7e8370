//! Testing utilities for graphkernel-based code.
//!
//! Assertions, a fluent graph builder, and canonical fixtures for
//! exercising the transformations against known topologies:
//!
//! - **Assertions**: [`assert_vertex_count`], [`assert_edge_count`],
//!   [`assert_isomorphic`]
//! - **Builder**: [`TestGraph`], a fluent `(from, label, to)` graph
//!   builder
//! - **Fixtures**: [`hypercube`], [`chain`] — canonical topologies for
//!   exercising each transformation
//!
//! # Quick Start
//!
//! ```no_run
//! use graphkernel::testing::*;
//!
//! let g = hypercube(4, 2).unwrap();
//! assert_vertex_count(&g, 16);
//! assert_edge_count(&g, 64);
//! ```

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
