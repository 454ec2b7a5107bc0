//! Drosophila crossing plan modelling and solving library.
//!
//! Components of the planner are separated by module.
//! Typical use is as follows:
//! ```
//! use flycross::genotype::{Genotype, Stock};
//! use flycross::solvers::beam_search::breeding_program;
//!
//! let stocks = vec![
//!     Stock::new("A", "2:CyO/+ 3:+/+".parse().unwrap()),
//!     Stock::new("B", "2:+/+ 3:TM3/+".parse().unwrap()),
//! ];
//! let target: Genotype = "2:CyO/+ 3:TM3/+".parse().unwrap();
//!
//! let plan = breeding_program(&stocks, &target, 2).unwrap().unwrap();
//! assert_eq!(1, plan.total_generations);
//! println!("{}", plan);
//! ```

/// Breeding roles, virtual stocks and broods
pub mod abstract_stocks;
pub mod config;
pub mod cross;
pub mod error;
pub mod extra;
pub mod genotype;
pub mod provenance;
pub mod rules;
pub mod solution;
pub mod solvers;

#[cfg(feature = "python")]
mod python;

pub use error::{CrossError, Result};
