// Domain layer: records, result collections and the ports the adapter and store plug into.

pub mod model;
pub mod ports;
