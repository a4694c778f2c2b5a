//! Next Thing Co. C.H.I.P. U13/U14 headers.
//!
//! The XIO expander pins sit at GPIO 1013-1020 on 4.4 kernels. PWM0 is
//! usable as a plain digital line only.

use crate::descriptor::Descriptor;
use crate::gpio::GpioDriver;
use crate::gpio::sysfs::SysfsDigitalPin;
use crate::i2c::{I2cDriver, LinuxI2cBus};
use crate::led::{LedDriver, SysfsLed};
use embd_common::config::HalConfig;
use embd_common::led::{LedDescriptor, LedMap};
use embd_common::pin::{Capability, PinDescriptor, PinMap};

static TABLE: &[PinDescriptor] = &[
    PinDescriptor {
        id: "XIO-P0",
        aliases: &["1013"],
        caps: Capability::DIGITAL,
        digital_logical: 1013,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "XIO-P1",
        aliases: &["1014"],
        caps: Capability::DIGITAL,
        digital_logical: 1014,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "XIO-P2",
        aliases: &["1015"],
        caps: Capability::DIGITAL,
        digital_logical: 1015,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "XIO-P3",
        aliases: &["1016"],
        caps: Capability::DIGITAL,
        digital_logical: 1016,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "XIO-P4",
        aliases: &["1017"],
        caps: Capability::DIGITAL,
        digital_logical: 1017,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "XIO-P5",
        aliases: &["1018"],
        caps: Capability::DIGITAL,
        digital_logical: 1018,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "XIO-P6",
        aliases: &["1019"],
        caps: Capability::DIGITAL,
        digital_logical: 1019,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "XIO-P7",
        aliases: &["1020"],
        caps: Capability::DIGITAL,
        digital_logical: 1020,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "CSIPCK",
        aliases: &["128"],
        caps: Capability::DIGITAL,
        digital_logical: 128,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "CSICK",
        aliases: &["129"],
        caps: Capability::DIGITAL,
        digital_logical: 129,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "CSIHSYNC",
        aliases: &["130"],
        caps: Capability::DIGITAL,
        digital_logical: 130,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "CSIVSYNC",
        aliases: &["131"],
        caps: Capability::DIGITAL,
        digital_logical: 131,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "CSID0",
        aliases: &["132"],
        caps: Capability::DIGITAL,
        digital_logical: 132,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "CSID1",
        aliases: &["133"],
        caps: Capability::DIGITAL,
        digital_logical: 133,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "CSID2",
        aliases: &["134"],
        caps: Capability::DIGITAL,
        digital_logical: 134,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "CSID3",
        aliases: &["135"],
        caps: Capability::DIGITAL,
        digital_logical: 135,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "CSID4",
        aliases: &["136"],
        caps: Capability::DIGITAL,
        digital_logical: 136,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "CSID5",
        aliases: &["137"],
        caps: Capability::DIGITAL,
        digital_logical: 137,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "CSID6",
        aliases: &["138"],
        caps: Capability::DIGITAL,
        digital_logical: 138,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "CSID7",
        aliases: &["139"],
        caps: Capability::DIGITAL,
        digital_logical: 139,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "TWI1-SCK",
        aliases: &["47"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 47,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "TWI1-SDA",
        aliases: &["48"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 48,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "TWI2-SCK",
        aliases: &["51"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 51,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "TWI2-SDA",
        aliases: &["52"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 52,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "PWM0",
        aliases: &["34"],
        caps: Capability::DIGITAL.union(Capability::PWM),
        digital_logical: 34,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "AP-EINT3",
        aliases: &["35"],
        caps: Capability::DIGITAL,
        digital_logical: 35,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "AP-EINT1",
        aliases: &["193"],
        caps: Capability::DIGITAL,
        digital_logical: 193,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "UART1-TX",
        aliases: &["195"],
        caps: Capability::DIGITAL.union(Capability::UART),
        digital_logical: 195,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "UART1-RX",
        aliases: &["196"],
        caps: Capability::DIGITAL.union(Capability::UART),
        digital_logical: 196,
        analog_logical: 0,
    },
];

/// Header pin table.
pub static PINS: PinMap = PinMap::new(TABLE);

/// Status LED.
pub static LEDS: LedMap = LedMap::new(&[LedDescriptor {
    id: "chip:white:status",
    aliases: &["0", "status", "STATUS"],
}]);

/// C.H.I.P. descriptor: sysfs GPIO, the TWI buses and the status LED. No SPI.
pub fn describe(_revision: u32) -> Descriptor {
    Descriptor {
        gpio: Some(Box::new(|config: &HalConfig| {
            GpioDriver::new(PINS, Some(SysfsDigitalPin::factory(&config.paths)), None, None)
        })),
        i2c: Some(Box::new(|config: &HalConfig| {
            I2cDriver::new(LinuxI2cBus::factory(&config.paths, config.i2c.write_delay()))
        })),
        led: Some(Box::new(|config: &HalConfig| {
            LedDriver::new(LEDS, SysfsLed::factory(&config.paths))
        })),
        spi: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xio_pins() {
        assert_eq!(PINS.lookup("XIO-P0", None).unwrap().digital_logical, 1013);
        assert_eq!(PINS.lookup(1020, None).unwrap().id, "XIO-P7");
        assert_eq!(PINS.lookup("CSID0", None).unwrap().digital_logical, 132);
    }

    #[test]
    fn no_spi() {
        assert!(describe(0).spi.is_none());
    }
}
