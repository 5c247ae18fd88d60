pub mod commit;
pub mod config;
pub mod indicator;
pub mod metrics;
pub mod monitor;
pub mod presenter;
pub mod query;
pub mod status;
pub mod vcs;
pub mod workspace;
