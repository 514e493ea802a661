// Domain layer: stylist models and the ports the external services plug into.

pub mod model;
pub mod ports;
