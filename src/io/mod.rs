//! JSON boundary between the core solver and the outside world
//! (spec.md §6): parses the input document into a frozen [`crate::models::Input`]
//! and serializes an assembled [`crate::solution::Solution`] back out.

pub mod input_json;
pub mod output_json;

pub use input_json::parse_input;
pub use output_json::{build_output, ComputingTimes};
