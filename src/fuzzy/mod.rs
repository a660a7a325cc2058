pub mod lexical;

pub use lexical::FuzzyIndex;
