// Library root: configuration, the forecasting pipeline and its result
// writers, exposed so integration tests can drive a full run.

pub mod config;
pub mod output;
pub mod pipeline;
