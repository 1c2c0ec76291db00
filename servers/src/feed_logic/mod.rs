pub mod config;
pub mod downstream;
pub mod simulator;
pub mod state;
pub mod ticker;
