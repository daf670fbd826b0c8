//! Domain types: bars, the normalized series, symbols, and range descriptors.

pub mod bar;
pub mod range;
pub mod symbol;

pub use bar::{Bar, NormalizedSeries, DATE_FORMAT};
pub use range::{Interval, ParseRangeError, Period};
pub use symbol::Symbol;
