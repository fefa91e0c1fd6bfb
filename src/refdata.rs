//! Reference data: historical closing prices and ESPP offer periods.
//! Loaded once per run, and only read afterwards.

pub mod io;
pub mod model;

pub type Error = String;

pub use self::io::*;
pub use self::model::*;
