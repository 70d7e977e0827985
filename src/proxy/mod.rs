pub mod endpoints;
pub mod forward;
pub mod handler;
pub mod liveness;
pub mod upstream;
