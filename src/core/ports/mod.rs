pub mod runner;
pub mod sink;
pub mod source;
pub mod store;
