//! Raspberry Pi P1 header, per board revision.
//!
//! Revision 1 boards route GPIO 0/1/21 where later boards route 2/3/27.
//! The 40-pin header of the B+ and later adds P1_27..P1_40.

use crate::descriptor::Descriptor;
use crate::gpio::GpioDriver;
use crate::gpio::sysfs::SysfsDigitalPin;
use crate::i2c::{I2cDriver, LinuxI2cBus};
use crate::led::{LedDriver, SysfsLed};
use crate::spi::{LinuxSpiBus, SpiDriver};
use embd_common::config::HalConfig;
use embd_common::led::{LedDescriptor, LedMap};
use embd_common::pin::{Capability, PinDescriptor, PinMap};

/// spidev minor of the SPI0 controller.
pub const SPI_MINOR: u8 = 0;

static REV1_TABLE: &[PinDescriptor] = &[
    PinDescriptor {
        id: "P1_3",
        aliases: &["0", "GPIO_0", "SDA", "I2C0_SDA"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 0,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_5",
        aliases: &["1", "GPIO_1", "SCL", "I2C0_SCL"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 1,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_7",
        aliases: &["4", "GPIO_4", "GPCLK0"],
        caps: Capability::DIGITAL,
        digital_logical: 4,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_8",
        aliases: &["14", "GPIO_14", "TXD", "UART0_TXD"],
        caps: Capability::DIGITAL.union(Capability::UART),
        digital_logical: 14,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_10",
        aliases: &["15", "GPIO_15", "RXD", "UART0_RXD"],
        caps: Capability::DIGITAL.union(Capability::UART),
        digital_logical: 15,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_11",
        aliases: &["17", "GPIO_17"],
        caps: Capability::DIGITAL,
        digital_logical: 17,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_12",
        aliases: &["18", "GPIO_18", "PCM_CLK"],
        caps: Capability::DIGITAL,
        digital_logical: 18,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_13",
        aliases: &["21", "GPIO_21"],
        caps: Capability::DIGITAL,
        digital_logical: 21,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_15",
        aliases: &["22", "GPIO_22"],
        caps: Capability::DIGITAL,
        digital_logical: 22,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_16",
        aliases: &["23", "GPIO_23"],
        caps: Capability::DIGITAL,
        digital_logical: 23,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_18",
        aliases: &["24", "GPIO_24"],
        caps: Capability::DIGITAL,
        digital_logical: 24,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_19",
        aliases: &["10", "GPIO_10", "MOSI", "SPI0_MOSI"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 10,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_21",
        aliases: &["9", "GPIO_9", "MISO", "SPI0_MISO"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 9,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_22",
        aliases: &["25", "GPIO_25"],
        caps: Capability::DIGITAL,
        digital_logical: 25,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_23",
        aliases: &["11", "GPIO_11", "SCLK", "SPI0_SCLK"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 11,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_24",
        aliases: &["8", "GPIO_8", "CE0", "SPI0_CE0_N"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 8,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_26",
        aliases: &["7", "GPIO_7", "CE1", "SPI0_CE1_N"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 7,
        analog_logical: 0,
    },
];

/// Original Model B (cpuinfo revisions 2 and 3).
pub static REV1_PINS: PinMap = PinMap::new(REV1_TABLE);

static REV2_TABLE: &[PinDescriptor] = &[
    PinDescriptor {
        id: "P1_3",
        aliases: &["2", "GPIO_2", "SDA", "I2C1_SDA"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 2,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_5",
        aliases: &["3", "GPIO_3", "SCL", "I2C1_SCL"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 3,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_7",
        aliases: &["4", "GPIO_4", "GPCLK0"],
        caps: Capability::DIGITAL,
        digital_logical: 4,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_8",
        aliases: &["14", "GPIO_14", "TXD", "UART0_TXD"],
        caps: Capability::DIGITAL.union(Capability::UART),
        digital_logical: 14,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_10",
        aliases: &["15", "GPIO_15", "RXD", "UART0_RXD"],
        caps: Capability::DIGITAL.union(Capability::UART),
        digital_logical: 15,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_11",
        aliases: &["17", "GPIO_17"],
        caps: Capability::DIGITAL,
        digital_logical: 17,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_12",
        aliases: &["18", "GPIO_18", "PCM_CLK"],
        caps: Capability::DIGITAL,
        digital_logical: 18,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_13",
        aliases: &["27", "GPIO_27"],
        caps: Capability::DIGITAL,
        digital_logical: 27,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_15",
        aliases: &["22", "GPIO_22"],
        caps: Capability::DIGITAL,
        digital_logical: 22,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_16",
        aliases: &["23", "GPIO_23"],
        caps: Capability::DIGITAL,
        digital_logical: 23,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_18",
        aliases: &["24", "GPIO_24"],
        caps: Capability::DIGITAL,
        digital_logical: 24,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_19",
        aliases: &["10", "GPIO_10", "MOSI", "SPI0_MOSI"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 10,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_21",
        aliases: &["9", "GPIO_9", "MISO", "SPI0_MISO"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 9,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_22",
        aliases: &["25", "GPIO_25"],
        caps: Capability::DIGITAL,
        digital_logical: 25,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_23",
        aliases: &["11", "GPIO_11", "SCLK", "SPI0_SCLK"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 11,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_24",
        aliases: &["8", "GPIO_8", "CE0", "SPI0_CE0_N"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 8,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_26",
        aliases: &["7", "GPIO_7", "CE1", "SPI0_CE1_N"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 7,
        analog_logical: 0,
    },
];

/// Model A/B revision 2 (26-pin header).
pub static REV2_PINS: PinMap = PinMap::new(REV2_TABLE);

static REV3_TABLE: &[PinDescriptor] = &[
    PinDescriptor {
        id: "P1_3",
        aliases: &["2", "GPIO_2", "SDA", "I2C1_SDA"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 2,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_5",
        aliases: &["3", "GPIO_3", "SCL", "I2C1_SCL"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 3,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_7",
        aliases: &["4", "GPIO_4", "GPCLK0"],
        caps: Capability::DIGITAL,
        digital_logical: 4,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_8",
        aliases: &["14", "GPIO_14", "TXD", "UART0_TXD"],
        caps: Capability::DIGITAL.union(Capability::UART),
        digital_logical: 14,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_10",
        aliases: &["15", "GPIO_15", "RXD", "UART0_RXD"],
        caps: Capability::DIGITAL.union(Capability::UART),
        digital_logical: 15,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_11",
        aliases: &["17", "GPIO_17"],
        caps: Capability::DIGITAL,
        digital_logical: 17,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_12",
        aliases: &["18", "GPIO_18", "PCM_CLK"],
        caps: Capability::DIGITAL,
        digital_logical: 18,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_13",
        aliases: &["27", "GPIO_27"],
        caps: Capability::DIGITAL,
        digital_logical: 27,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_15",
        aliases: &["22", "GPIO_22"],
        caps: Capability::DIGITAL,
        digital_logical: 22,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_16",
        aliases: &["23", "GPIO_23"],
        caps: Capability::DIGITAL,
        digital_logical: 23,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_18",
        aliases: &["24", "GPIO_24"],
        caps: Capability::DIGITAL,
        digital_logical: 24,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_19",
        aliases: &["10", "GPIO_10", "MOSI", "SPI0_MOSI"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 10,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_21",
        aliases: &["9", "GPIO_9", "MISO", "SPI0_MISO"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 9,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_22",
        aliases: &["25", "GPIO_25"],
        caps: Capability::DIGITAL,
        digital_logical: 25,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_23",
        aliases: &["11", "GPIO_11", "SCLK", "SPI0_SCLK"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 11,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_24",
        aliases: &["8", "GPIO_8", "CE0", "SPI0_CE0_N"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 8,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_26",
        aliases: &["7", "GPIO_7", "CE1", "SPI0_CE1_N"],
        caps: Capability::DIGITAL.union(Capability::SPI),
        digital_logical: 7,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_27",
        aliases: &["0", "GPIO_0", "ID_SD"],
        caps: Capability::DIGITAL,
        digital_logical: 0,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_28",
        aliases: &["1", "GPIO_1", "ID_SC"],
        caps: Capability::DIGITAL,
        digital_logical: 1,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_29",
        aliases: &["5", "GPIO_5"],
        caps: Capability::DIGITAL,
        digital_logical: 5,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_31",
        aliases: &["6", "GPIO_6"],
        caps: Capability::DIGITAL,
        digital_logical: 6,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_32",
        aliases: &["12", "GPIO_12"],
        caps: Capability::DIGITAL,
        digital_logical: 12,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_33",
        aliases: &["13", "GPIO_13"],
        caps: Capability::DIGITAL,
        digital_logical: 13,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_35",
        aliases: &["19", "GPIO_19"],
        caps: Capability::DIGITAL,
        digital_logical: 19,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_36",
        aliases: &["16", "GPIO_16"],
        caps: Capability::DIGITAL,
        digital_logical: 16,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_37",
        aliases: &["26", "GPIO_26"],
        caps: Capability::DIGITAL,
        digital_logical: 26,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_38",
        aliases: &["20", "GPIO_20"],
        caps: Capability::DIGITAL,
        digital_logical: 20,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P1_40",
        aliases: &["21", "GPIO_21"],
        caps: Capability::DIGITAL,
        digital_logical: 21,
        analog_logical: 0,
    },
];

/// B+, Pi 2 and later (40-pin header).
pub static REV3_PINS: PinMap = PinMap::new(REV3_TABLE);

/// The ACT LED.
pub static LEDS: LedMap = LedMap::new(&[LedDescriptor {
    id: "led0",
    aliases: &["0", "led0", "LED0"],
}]);

/// Pin map for a `Revision` value from `/proc/cpuinfo`.
pub fn pin_map(revision: u32) -> PinMap {
    match revision {
        0..4 => REV1_PINS,
        4..16 => REV2_PINS,
        _ => REV3_PINS,
    }
}

/// Raspberry Pi descriptor: sysfs GPIO (digital only), i2c-dev, spidev0.N
/// and the ACT LED.
pub fn describe(revision: u32) -> Descriptor {
    let pins = pin_map(revision);
    Descriptor {
        gpio: Some(Box::new(move |config: &HalConfig| {
            GpioDriver::new(pins, Some(SysfsDigitalPin::factory(&config.paths)), None, None)
        })),
        i2c: Some(Box::new(|config: &HalConfig| {
            I2cDriver::new(LinuxI2cBus::factory(&config.paths, config.i2c.write_delay()))
        })),
        led: Some(Box::new(|config: &HalConfig| {
            LedDriver::new(LEDS, SysfsLed::factory(&config.paths))
        })),
        spi: Some(Box::new(|config: &HalConfig| {
            SpiDriver::new(
                config.spi.clone(),
                LinuxSpiBus::factory(&config.paths, SPI_MINOR, None),
            )
        })),
    }
}
