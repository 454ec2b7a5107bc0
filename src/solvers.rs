//! A submodule for the plan searches.
//!
//! Each search has a function `breeding_program` which finds a crossing plan from a set of stocks
//! to a target genotype.

/// Generation-bounded beam search over virtual stocks and sibling crosses
pub mod beam_search;
