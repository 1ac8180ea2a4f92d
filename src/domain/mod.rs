// Domain layer: declaration records and the ports to the outside world.

pub mod model;
pub mod ports;
