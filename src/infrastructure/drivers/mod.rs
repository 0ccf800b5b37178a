mod flash_storage;

pub use flash_storage::{NorFlashPrimitive, RegionLayout};

/// Flash primitive over the on-chip SPI flash of the ESP32.
#[cfg(feature = "esp32")]
pub type EspFlashPrimitive = NorFlashPrimitive<esp_storage::FlashStorage<'static>>;
