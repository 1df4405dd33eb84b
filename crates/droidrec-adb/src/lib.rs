pub mod device;
pub mod parse;

pub use device::{AdbDevice, DeviceError, EventStream};
