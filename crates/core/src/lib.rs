#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod pool;
pub mod session;
pub mod time;
pub mod timed;

pub use error::Error;
pub use time::Clock;
