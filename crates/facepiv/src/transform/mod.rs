//! The transform planner (C5) and executor (C6): together they turn a detected face plus
//! landmarks into a 420x560 PIV-geometry canvas.

pub mod exec;
pub mod plan;

pub use exec::{execute, remap_point};
pub use plan::{plan, PivTransform};
