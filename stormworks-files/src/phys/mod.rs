pub mod grid;
pub mod reader;
pub mod types;
pub mod writer;
