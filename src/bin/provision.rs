//! Keystore Firmware
//!
//! Opens the redundant credential store at boot:
//! - Optionally writes the factory image to both copies
//! - Verifies both control block copies and repairs a torn one
//! - Reports which credentials are provisioned over the serial console
//! - Halts forever when neither copy can be trusted

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::{clock::CpuClock, timer::timg::TimerGroup};
use esp_println::println;
use esp_storage::FlashStorage;
use myrtio_keystore::{
    HaltReason,
    Keystore,
    ObjectKind,
    Pkcs11Pal,
    RegionLayout,
    SharedKeystore,
    StoreError,
    infrastructure::drivers::EspFlashPrimitive,
    provision_factory_image,
};

esp_bootloader_esp_idf::esp_app_desc!();

/// Interval between halt banners on the serial console.
const HALT_REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Build with `KEYSTORE_PROVISION=1` to write the factory image at boot.
const PROVISION_FACTORY_IMAGE: bool = option_env!("KEYSTORE_PROVISION").is_some();

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();

    println!("=================================");
    println!("  MyrtIO Keystore Firmware");
    println!("=================================");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let flash = FlashStorage::new(peripherals.FLASH);
    let mut flash = match EspFlashPrimitive::new(flash, RegionLayout::PARTITIONS) {
        Ok(flash) => flash,
        Err(err) => {
            println!("keystore: invalid partition layout: {}", err);
            park().await
        }
    };

    if PROVISION_FACTORY_IMAGE {
        match provision_factory_image(&mut flash) {
            Ok(()) => println!("keystore: factory image written"),
            Err(err) => println!("keystore: provisioning failed: {}", err),
        }
    }

    let store = match Keystore::open(flash) {
        Ok(store) => store,
        Err(StoreError::Halted(reason)) => halt(reason).await,
        Err(err) => {
            println!("keystore: open failed: {}", err);
            park().await
        }
    };
    if !store.last_recovery().is_clean() {
        println!("keystore: repaired {:?}", store.last_recovery().repairs());
    }

    let store = SharedKeystore::new(store);
    let pal = Pkcs11Pal::new(&store);

    for kind in [
        ObjectKind::DevicePrivateKey,
        ObjectKind::DevicePublicKey,
        ObjectKind::DeviceCertificate,
        ObjectKind::CodeSigningKey,
    ] {
        let handle = pal.find_object(kind.label());
        match pal.get_object_value(handle, |data, is_private| (data.len(), is_private)) {
            Ok((len, true)) => println!("keystore: {}: {} bytes (private)", kind.label(), len),
            Ok((len, false)) => println!("keystore: {}: {} bytes", kind.label(), len),
            Err(_) => println!("keystore: {}: not provisioned", kind.label()),
        }
    }

    park().await
}

/// Corrupted key material must never be served: report and wait forever.
async fn halt(reason: HaltReason) -> ! {
    loop {
        Timer::after(HALT_REPORT_INTERVAL).await;
        println!("------------------------------------------------");
        println!("Data flash is completely broken: {}.", reason);
        println!("Please erase all code flash.");
        println!("And, write initial firmware using debugger/rom writer.");
        println!("------------------------------------------------");
    }
}

async fn park() -> ! {
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
