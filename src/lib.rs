pub mod annotations;
pub mod check;
pub mod cli;
pub mod comment;
pub mod config;
pub mod error;
pub mod format;
pub mod github;
pub mod istanbul;
pub mod model;
pub mod report;
pub mod results;
pub mod runner;
