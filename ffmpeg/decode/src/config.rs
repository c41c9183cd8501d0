/*!
    Decoder configuration types.
*/

use crate::hw::HwDevice;

/**
    Configuration for video decoders.
*/
#[derive(Clone, Debug, Default)]
pub struct VideoDecoderConfig {
    /// Accelerator to decode on, [`HwDevice::None`] for software decoding.
    pub hw_device: HwDevice,
}

impl VideoDecoderConfig {
    /**
        Create a new config with default settings (software decoding).
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Create a config that prefers the platform's usual accelerator.
    */
    pub fn with_hw_accel() -> Self {
        Self {
            hw_device: HwDevice::platform_default(),
        }
    }

    /**
        Create a config with a specific hardware device.
    */
    pub fn with_hw_device(device: HwDevice) -> Self {
        Self { hw_device: device }
    }

    /**
        Returns true if a hardware device is requested.
    */
    pub fn prefers_hw(&self) -> bool {
        self.hw_device != HwDevice::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_software() {
        let config = VideoDecoderConfig::new();
        assert_eq!(config.hw_device, HwDevice::None);
        assert!(!config.prefers_hw());
    }

    #[test]
    fn with_hw_device() {
        let config = VideoDecoderConfig::with_hw_device(HwDevice::Qsv);
        assert_eq!(config.hw_device, HwDevice::Qsv);
        assert!(config.prefers_hw());
    }

    #[test]
    fn with_hw_accel_uses_platform_default() {
        let config = VideoDecoderConfig::with_hw_accel();
        assert_eq!(config.hw_device, HwDevice::platform_default());
    }
}
