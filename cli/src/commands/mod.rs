pub mod cli;
pub mod query;
