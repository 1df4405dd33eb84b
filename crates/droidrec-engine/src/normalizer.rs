//! Raw device coordinates to on-screen pixels.

use droidrec_common::error::ConfigError;

/// Linear mapping for one axis: `floor(raw * pixel_extent / device_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisScale {
    device_max: u32,
    pixel_extent: u32,
}

impl AxisScale {
    pub fn new(axis: &'static str, device_max: u32, pixel_extent: u32) -> Result<Self, ConfigError> {
        if device_max == 0 {
            return Err(ConfigError::ZeroDeviceRange { axis });
        }
        Ok(Self {
            device_max,
            pixel_extent,
        })
    }

    pub fn device_max(&self) -> u32 {
        self.device_max
    }

    pub fn pixel_extent(&self) -> u32 {
        self.pixel_extent
    }

    pub fn scale(&self, raw: u32) -> i32 {
        let scaled = u64::from(raw) * u64::from(self.pixel_extent) / u64::from(self.device_max);
        i32::try_from(scaled).unwrap_or(i32::MAX)
    }

    /// Parses a hexadecimal magnitude as printed by the producer and scales it.
    /// Returns `None` for anything that is not a hex number.
    pub fn scale_hex(&self, hex: &str) -> Option<i32> {
        u32::from_str_radix(hex.trim(), 16)
            .ok()
            .map(|raw| self.scale(raw))
    }
}

/// Screen geometry and touch range of the recorded device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceGeometry {
    pub screen_width: u32,
    pub screen_height: u32,
    pub touch_max_x: u32,
    pub touch_max_y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateNormalizer {
    pub x: AxisScale,
    pub y: AxisScale,
}

impl CoordinateNormalizer {
    pub fn new(geometry: DeviceGeometry) -> Result<Self, ConfigError> {
        Ok(Self {
            x: AxisScale::new("x", geometry.touch_max_x, geometry.screen_width)?,
            y: AxisScale::new("y", geometry.touch_max_y, geometry.screen_height)?,
        })
    }
}
