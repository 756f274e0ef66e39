pub mod config;
pub mod rpc;
pub mod time;
pub mod utils;
