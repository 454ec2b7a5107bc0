//! Helpers around the planner: stock files, random instances and drawing.

pub mod instance_generators;
pub mod stocks;
pub mod visualisation;
