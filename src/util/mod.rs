//! Small helpers shared by the runner and the result writers

pub mod number;
pub mod time;
