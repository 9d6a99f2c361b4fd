pub mod api;
pub mod assemble;
pub mod cache;
pub mod combo;
pub mod config;
pub mod context;
pub mod error;
pub mod presets;
pub mod sequence;
pub mod service;
pub mod session;
pub mod source;
pub mod stub;
pub mod tags;
pub mod tenant;
pub mod window;
