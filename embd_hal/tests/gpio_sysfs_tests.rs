//! Generic GPIO driver over sysfs pins in a fake `/sys/class/gpio`.

use embd_common::Error;
use embd_common::config::PathsConfig;
use embd_common::pin::Capability;
use embd_hal::boards::{bbb, rpi};
use embd_hal::gpio::sysfs::{SysfsDigitalPin, pin_dir};
use embd_hal::gpio::{DigitalPin, Direction, Edge, GpioDriver, Level, PinLink};
use embd_hal::interrupt::Dispatcher;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn fake_gpio(root: &Path, pins: &[u32]) -> PathsConfig {
    let paths = PathsConfig::under(root);
    let gpio = paths.gpio_dir();
    fs::create_dir_all(&gpio).unwrap();
    fs::write(gpio.join("export"), "").unwrap();
    fs::write(gpio.join("unexport"), "").unwrap();
    for n in pins {
        let dir = pin_dir(&gpio, *n);
        fs::create_dir_all(&dir).unwrap();
        for (name, value) in [("direction", "in"), ("value", "0"), ("active_low", "0"), ("edge", "none")] {
            fs::write(dir.join(name), value).unwrap();
        }
    }
    paths
}

fn driver(paths: &PathsConfig) -> GpioDriver {
    GpioDriver::new(
        rpi::REV3_PINS,
        Some(SysfsDigitalPin::factory(paths)),
        None,
        None,
    )
}

fn attr(paths: &PathsConfig, n: u32, name: &str) -> PathBuf {
    pin_dir(&paths.gpio_dir(), n).join(name)
}

#[test]
fn pins_are_exported_lazily() {
    let dir = TempDir::new().unwrap();
    let paths = fake_gpio(dir.path(), &[17]);
    let driver = driver(&paths);

    let pin = driver.digital_pin(17).unwrap();
    assert_eq!(pin.id(), "P1_11");
    assert_eq!(pin.n(), 17);
    assert_eq!(fs::read_to_string(paths.gpio_dir().join("export")).unwrap(), "");

    pin.set_direction(Direction::Out).unwrap();
    assert_eq!(fs::read_to_string(paths.gpio_dir().join("export")).unwrap(), "17");
}

#[test]
fn missing_pin_directory_surfaces_as_io_error() {
    let dir = TempDir::new().unwrap();
    let paths = fake_gpio(dir.path(), &[]);
    let driver = driver(&paths);

    let pin = driver.digital_pin("P1_11").unwrap();
    assert!(matches!(pin.read(), Err(Error::Io { op: "open", .. })));
}

#[test]
fn export_without_attributes_is_still_unexported_on_close() {
    let dir = TempDir::new().unwrap();
    let paths = fake_gpio(dir.path(), &[]);
    let pin = driver(&paths).digital_pin(4).unwrap();

    // The kernel accepted the export but gpio4/ never showed up.
    assert!(matches!(pin.read(), Err(Error::Io { op: "open", .. })));
    assert_eq!(fs::read_to_string(paths.gpio_dir().join("export")).unwrap(), "4");

    pin.close().unwrap();
    assert_eq!(fs::read_to_string(paths.gpio_dir().join("unexport")).unwrap(), "4");
}

#[test]
fn value_and_active_low_are_written_in_place() {
    let dir = TempDir::new().unwrap();
    let paths = fake_gpio(dir.path(), &[22]);
    let driver = driver(&paths);
    let pin = driver.digital_pin("GPIO_22").unwrap();

    pin.write(Level::High).unwrap();
    assert_eq!(fs::read_to_string(attr(&paths, 22, "value")).unwrap(), "1");
    assert_eq!(pin.read().unwrap(), Level::High);

    pin.active_low(true).unwrap();
    assert_eq!(fs::read_to_string(attr(&paths, 22, "active_low")).unwrap(), "1");
    pin.active_low(false).unwrap();
    assert_eq!(fs::read_to_string(attr(&paths, 22, "active_low")).unwrap(), "0");
}

#[test]
fn read_of_empty_value_file_is_short() {
    let dir = TempDir::new().unwrap();
    let paths = fake_gpio(dir.path(), &[27]);
    fs::write(attr(&paths, 27, "value"), "").unwrap();
    let pin = driver(&paths).digital_pin(27).unwrap();

    assert!(matches!(
        pin.read(),
        Err(Error::ShortTransfer { expected: 1, actual: 0, .. })
    ));
}

#[test]
fn driver_close_unexports_every_used_pin() {
    let dir = TempDir::new().unwrap();
    let paths = fake_gpio(dir.path(), &[5, 6]);
    let driver = driver(&paths);

    let a = driver.digital_pin(5).unwrap();
    let b = driver.digital_pin(6).unwrap();
    a.read().unwrap();
    assert_eq!(driver.open_pins(), 2);

    driver.close().unwrap();
    assert_eq!(driver.open_pins(), 0);
    // Only the pin that was exported gets unexported.
    assert_eq!(fs::read_to_string(paths.gpio_dir().join("unexport")).unwrap(), "5");
    assert!(matches!(b.read(), Err(Error::Closed(_))));
}

#[test]
fn non_digital_keys_are_not_found() {
    let dir = TempDir::new().unwrap();
    let paths = fake_gpio(dir.path(), &[]);
    let driver = GpioDriver::new(
        bbb::PINS,
        Some(SysfsDigitalPin::factory(&paths)),
        None,
        None,
    );

    // ADC inputs are in the map but cannot be opened as digital pins.
    assert!(driver.pin_map().lookup("AIN0", None).is_some());
    assert!(driver.pin_map().lookup("AIN0", Some(Capability::DIGITAL)).is_none());
    assert!(matches!(driver.digital_pin("AIN0"), Err(Error::NotFound { .. })));
    assert!(matches!(driver.digital_pin("P1_1"), Err(Error::NotFound { .. })));
}

#[test]
fn watch_writes_edge_before_registering() {
    let dir = TempDir::new().unwrap();
    let paths = fake_gpio(dir.path(), &[4]);
    let desc = rpi::REV3_PINS.lookup(4, None).unwrap();
    let dispatcher = Dispatcher::new().unwrap();
    let pin = SysfsDigitalPin::with_dispatcher(
        desc,
        paths.gpio_dir(),
        PinLink::detached(desc.id),
        Arc::clone(&dispatcher),
    );

    // Regular files cannot be added to an epoll set, so registration fails
    // once the edge attribute has been configured.
    let result = pin.watch(Edge::Rising, Box::new(|_: &dyn DigitalPin| {}));
    assert!(matches!(result, Err(Error::Sys { .. })));
    assert_eq!(fs::read_to_string(attr(&paths, 4, "edge")).unwrap(), "rising");
    assert!(dispatcher.is_empty());

    // Nothing is registered, so stopping is a no-op.
    pin.stop_watching().unwrap();
    pin.close().unwrap();
}

#[test]
fn watch_delivers_edges_until_stopped_or_closed() {
    let dir = TempDir::new().unwrap();
    let paths = fake_gpio(dir.path(), &[4]);
    // A FIFO stands in for the value file so epoll accepts it.
    let value = attr(&paths, 4, "value");
    fs::remove_file(&value).unwrap();
    mkfifo(&value, Mode::S_IRUSR | Mode::S_IWUSR).unwrap();

    let desc = rpi::REV3_PINS.lookup(4, None).unwrap();
    let dispatcher = Dispatcher::new().unwrap();
    let pin = SysfsDigitalPin::with_dispatcher(
        desc,
        paths.gpio_dir(),
        PinLink::detached(desc.id),
        Arc::clone(&dispatcher),
    );

    let seen: Arc<Mutex<Vec<String>>> = Arc::default();
    let record = Arc::clone(&seen);
    pin.watch(
        Edge::Both,
        Box::new(move |pin: &dyn DigitalPin| record.lock().push(pin.id().to_string())),
    )
    .unwrap();
    assert_eq!(dispatcher.len(), 1);
    assert_eq!(fs::read_to_string(attr(&paths, 4, "edge")).unwrap(), "both");

    let mut line = OpenOptions::new().write(true).open(&value).unwrap();
    line.write_all(b"1").unwrap();
    thread::sleep(Duration::from_millis(100));
    assert!(seen.lock().is_empty());

    line.write_all(b"0").unwrap();
    let deadline = Instant::now() + Duration::from_secs(2);
    while seen.lock().is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(*seen.lock(), vec!["P1_7".to_string()]);

    pin.stop_watching().unwrap();
    assert!(dispatcher.is_empty());
    line.write_all(b"1").unwrap();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(seen.lock().len(), 1);

    pin.watch(Edge::Rising, Box::new(|_: &dyn DigitalPin| {})).unwrap();
    assert_eq!(dispatcher.len(), 1);
    pin.close().unwrap();
    assert!(dispatcher.is_empty());
    assert_eq!(fs::read_to_string(paths.gpio_dir().join("unexport")).unwrap(), "4");
}

#[test]
fn time_pulse_respects_timeout() {
    let dir = TempDir::new().unwrap();
    let paths = fake_gpio(dir.path(), &[4]);
    let pin = driver(&paths).digital_pin(4).unwrap();
    pin.write(Level::High).unwrap();

    let err = pin
        .time_pulse(Level::High, Duration::from_millis(20))
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
}
