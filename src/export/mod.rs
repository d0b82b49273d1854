pub mod csv;
pub mod flatten;
