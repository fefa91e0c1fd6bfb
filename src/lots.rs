//! Tax lot calculations for sales of the original security, including
//! the shares exchanged in the cash and stock merger.

pub mod aggregate;
pub mod classify;
pub mod cost_basis;
pub mod csv_common;
pub mod fractional;
pub mod holding;
pub mod io;
pub mod model;
pub mod process;
pub mod render;

pub use self::model::error::*;
pub use self::model::lot::*;
pub use self::model::merger::*;
pub use self::model::plan::*;
pub use self::model::term::*;
