//! Application services: reactions to network events.
//!
//! Each service struct accepts its collaborators via constructor parameters
//! (port implementations, queue handles), keeping this layer decoupled from
//! concrete adapters.

pub mod alerter;
pub mod motion_light;
pub mod threshold_alerts;
pub mod value_recorder;
