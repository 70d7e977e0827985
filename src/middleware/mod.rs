pub mod headers;
pub mod metrics;
