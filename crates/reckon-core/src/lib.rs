pub mod aggregate;
pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod model;
pub mod patch;
pub mod pricing;
pub mod reconcile;
pub mod status;
pub mod timing;
