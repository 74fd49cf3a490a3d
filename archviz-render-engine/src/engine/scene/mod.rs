pub mod grid;
pub mod lighting;
