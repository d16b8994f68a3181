// Parley Atoms — shared primitives
// The smallest pieces: error types and the data model. No I/O here.

pub mod error;
pub mod types;
