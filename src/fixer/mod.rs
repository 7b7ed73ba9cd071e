pub mod audit;
pub mod backup;
pub mod batch;
pub mod config;
pub mod detect;
pub mod merge;
pub mod parse;
pub mod paths;
pub mod repair;
pub mod scrub;
pub mod warn;
