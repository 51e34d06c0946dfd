//! Network algorithms: geometry helpers, coordinate transforms, topology
//! optimization and connectivity cleaning

pub mod connectivity;
pub mod geometry;
pub mod optimizer;
pub mod transform;

pub use connectivity::{ConnectivityStrategy, NetworkCleaner};
pub use optimizer::{NetworkOptimizer, OptimizedNetwork};
pub use transform::{CoordinateTransform, transform_for, transform_network};
