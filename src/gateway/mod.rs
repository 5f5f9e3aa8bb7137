//! Gateway implementation

mod builder;
mod media;
pub mod resource;
pub mod shape;

pub use builder::{Cinegate, CinegateBuilder};
pub use media::{GatewayStats, HealthReport, MediaGateway};
pub use resource::Resource;
