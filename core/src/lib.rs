extern crate self as progtoken_core;

pub mod log;
