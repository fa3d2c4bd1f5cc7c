//! Services of the Livoltek bridge.
mod bridge;
pub mod coordinator;
pub mod registry;
pub mod sensors;

pub use bridge::LivoltekBridgeBackgroundService;
pub use coordinator::{Coordinator, CoordinatorState, LivoltekSettings, Snapshot};
pub use registry::{DeviceEntry, DeviceRegistry};
