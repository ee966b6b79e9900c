pub mod cli;
pub mod helper;
pub mod params_generator;
pub mod pipelines;
