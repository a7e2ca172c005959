// Diagram graph: model, multiplicity formatting and the builder

pub mod builder;
pub mod model;
pub mod multiplicity;

pub use builder::{attribute_line, BuildOutput, GraphBuilder};
pub use model::*;
pub use multiplicity::{Multiplicity, UNBOUNDED};
