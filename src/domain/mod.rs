// Domain layer: recipe models and the three plugin roles.

pub mod model;
pub mod ports;
