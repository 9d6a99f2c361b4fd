pub mod cache;
pub mod factory;
pub mod services;
pub mod source;
pub mod tags;
