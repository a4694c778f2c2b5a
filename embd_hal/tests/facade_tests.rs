//! Process-wide façade. Kept to a single test because the façade state is
//! global to the test binary.

use embd_common::Error;
use embd_common::config::{HalConfig, PathsConfig};
use embd_common::host::Host;
use embd_hal::gpio::{Direction, Level};
use embd_hal::{Hal, HostRegistry, facade};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn fake_rpi(root: &std::path::Path) -> HalConfig {
    let paths = PathsConfig::under(root);
    let gpio = paths.gpio_dir();
    let pin = gpio.join("gpio4");
    fs::create_dir_all(&pin).unwrap();
    fs::write(gpio.join("export"), "").unwrap();
    fs::write(gpio.join("unexport"), "").unwrap();
    for (name, value) in [("direction", "in"), ("value", "0"), ("active_low", "0"), ("edge", "none")] {
        fs::write(pin.join(name), value).unwrap();
    }
    let led = paths.leds_dir().join("led0");
    fs::create_dir_all(&led).unwrap();
    fs::write(led.join("brightness"), "0").unwrap();

    let mut config = HalConfig::default();
    config.host.tag = Some(Host::Rpi);
    config.host.revision = Some(0x10);
    config.paths = paths;
    config
}

#[test]
fn facade_forwards_to_installed_context() {
    let dir = TempDir::new().unwrap();
    let config = fake_rpi(dir.path());
    let gpio = config.paths.gpio_dir();
    let hal = Hal::with_registry(&HostRegistry::with_builtin_boards(), config).unwrap();
    assert!(facade::install(hal).is_none());

    assert_eq!(facade::detect_host().unwrap(), (Host::Rpi, 0x10));

    // Explicit init, then a second init without close.
    facade::init_gpio().unwrap();
    assert!(matches!(facade::init_gpio(), Err(Error::AlreadyInitialized("gpio"))));

    facade::set_direction(4, Direction::Out).unwrap();
    facade::digital_write("GPIO_4", Level::High).unwrap();
    assert_eq!(facade::digital_read("P1_7").unwrap(), Level::High);
    assert_eq!(fs::read_to_string(gpio.join("export")).unwrap(), "4");

    let a = facade::new_digital_pin(4).unwrap();
    let b = facade::new_digital_pin("P1_7").unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    facade::close_gpio().unwrap();
    assert_eq!(fs::read_to_string(gpio.join("unexport")).unwrap(), "4");
    facade::init_gpio().unwrap();

    facade::led_on(0).unwrap();
    assert!(facade::new_led("led0").unwrap().is_on().unwrap());
    facade::led_toggle("LED0").unwrap();
    facade::close_led().unwrap();

    assert!(matches!(
        facade::analog_read("P1_7"),
        Err(Error::IoNotSupported("analog"))
    ));

    facade::close().unwrap();
    // Closing with nothing installed is a no-op.
    facade::close().unwrap();
}
