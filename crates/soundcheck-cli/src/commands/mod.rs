//! CLI command implementations.

pub mod check;
pub mod common;
pub mod devices;
pub mod layouts;
pub mod live;
pub mod process;
pub mod run;
