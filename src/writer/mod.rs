//! Formats resolved symbols into nm-style output lines: a fixed-width hex
//! value, a single classification letter, and the symbol name.
pub mod flags;
pub mod line;
pub mod value;

pub use flags::*;
pub use line::*;
pub use value::*;
