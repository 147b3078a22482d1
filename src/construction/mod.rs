//! Initial solution construction: homogeneous and dynamic regret-weighted
//! cheapest-insertion heuristics (spec.md §4.6).

mod heuristic;

pub use heuristic::{construct, ConstructionConfig, InitMode, FALLBACK_TABLE};
