pub mod approot;
pub mod input_parse;
pub mod outfmt;

// Versioned by date rather than by crate semver, as 0.YY.MM[.i].
// The minor increment is for fixes within a month.
pub const VMW_TAX_APP_VERSION: &str = "0.24.01";
