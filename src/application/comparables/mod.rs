pub mod finder;

pub use finder::{ComparableFinder, ComparableSearch};
