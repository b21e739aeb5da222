pub mod catalog;
pub mod config;
pub mod gate;
pub mod hint;
pub mod run;
pub mod simulate;
