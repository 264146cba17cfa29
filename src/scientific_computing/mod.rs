pub mod quadratic;
pub mod statistics;
