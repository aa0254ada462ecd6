pub mod config;
pub mod intervals;
pub mod plan;
pub mod run;
pub mod sounds;
