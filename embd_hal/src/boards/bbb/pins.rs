//! BeagleBone Black P8/P9 header.
//!
//! Digital aliases are the kernel GPIO number, bare and as `GPIO_<n>`. ADC
//! inputs are listed by their `AIN<n>` channel.

use embd_common::led::{LedDescriptor, LedMap};
use embd_common::pin::{Capability, PinDescriptor, PinMap};

static TABLE: &[PinDescriptor] = &[
    PinDescriptor {
        id: "P8_03",
        aliases: &["38", "GPIO_38", "GPMC_AD6"],
        caps: Capability::DIGITAL.union(Capability::GPMC),
        digital_logical: 38,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_04",
        aliases: &["39", "GPIO_39", "GPMC_AD7"],
        caps: Capability::DIGITAL.union(Capability::GPMC),
        digital_logical: 39,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_05",
        aliases: &["34", "GPIO_34"],
        caps: Capability::DIGITAL,
        digital_logical: 34,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_06",
        aliases: &["35", "GPIO_35"],
        caps: Capability::DIGITAL,
        digital_logical: 35,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_07",
        aliases: &["66", "GPIO_66"],
        caps: Capability::DIGITAL,
        digital_logical: 66,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_08",
        aliases: &["67", "GPIO_67"],
        caps: Capability::DIGITAL,
        digital_logical: 67,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_09",
        aliases: &["69", "GPIO_69"],
        caps: Capability::DIGITAL,
        digital_logical: 69,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_10",
        aliases: &["68", "GPIO_68"],
        caps: Capability::DIGITAL,
        digital_logical: 68,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_11",
        aliases: &["45", "GPIO_45"],
        caps: Capability::DIGITAL,
        digital_logical: 45,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_12",
        aliases: &["44", "GPIO_44"],
        caps: Capability::DIGITAL,
        digital_logical: 44,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_13",
        aliases: &["23", "GPIO_23", "EHRPWM2B"],
        caps: Capability::DIGITAL.union(Capability::PWM),
        digital_logical: 23,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_14",
        aliases: &["26", "GPIO_26"],
        caps: Capability::DIGITAL,
        digital_logical: 26,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_15",
        aliases: &["47", "GPIO_47"],
        caps: Capability::DIGITAL,
        digital_logical: 47,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_16",
        aliases: &["46", "GPIO_46"],
        caps: Capability::DIGITAL,
        digital_logical: 46,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_17",
        aliases: &["27", "GPIO_27"],
        caps: Capability::DIGITAL,
        digital_logical: 27,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_18",
        aliases: &["65", "GPIO_65"],
        caps: Capability::DIGITAL,
        digital_logical: 65,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_19",
        aliases: &["22", "GPIO_22", "EHRPWM2A"],
        caps: Capability::DIGITAL.union(Capability::PWM),
        digital_logical: 22,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_20",
        aliases: &["63", "GPIO_63"],
        caps: Capability::DIGITAL,
        digital_logical: 63,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_21",
        aliases: &["62", "GPIO_62"],
        caps: Capability::DIGITAL,
        digital_logical: 62,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_22",
        aliases: &["37", "GPIO_37"],
        caps: Capability::DIGITAL,
        digital_logical: 37,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_23",
        aliases: &["36", "GPIO_36"],
        caps: Capability::DIGITAL,
        digital_logical: 36,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_24",
        aliases: &["33", "GPIO_33"],
        caps: Capability::DIGITAL,
        digital_logical: 33,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_25",
        aliases: &["32", "GPIO_32"],
        caps: Capability::DIGITAL,
        digital_logical: 32,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_26",
        aliases: &["61", "GPIO_61"],
        caps: Capability::DIGITAL,
        digital_logical: 61,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_27",
        aliases: &["86", "GPIO_86", "LCD_VSYNC"],
        caps: Capability::DIGITAL.union(Capability::LCD),
        digital_logical: 86,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_28",
        aliases: &["88", "GPIO_88", "LCD_PCLK"],
        caps: Capability::DIGITAL.union(Capability::LCD),
        digital_logical: 88,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_29",
        aliases: &["87", "GPIO_87"],
        caps: Capability::DIGITAL,
        digital_logical: 87,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_30",
        aliases: &["89", "GPIO_89"],
        caps: Capability::DIGITAL,
        digital_logical: 89,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_31",
        aliases: &["10", "GPIO_10"],
        caps: Capability::DIGITAL,
        digital_logical: 10,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_32",
        aliases: &["11", "GPIO_11"],
        caps: Capability::DIGITAL,
        digital_logical: 11,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_33",
        aliases: &["9", "GPIO_9"],
        caps: Capability::DIGITAL,
        digital_logical: 9,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_34",
        aliases: &["81", "GPIO_81"],
        caps: Capability::DIGITAL,
        digital_logical: 81,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_35",
        aliases: &["8", "GPIO_8"],
        caps: Capability::DIGITAL,
        digital_logical: 8,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_36",
        aliases: &["80", "GPIO_80"],
        caps: Capability::DIGITAL,
        digital_logical: 80,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_37",
        aliases: &["78", "GPIO_78"],
        caps: Capability::DIGITAL,
        digital_logical: 78,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_38",
        aliases: &["79", "GPIO_79"],
        caps: Capability::DIGITAL,
        digital_logical: 79,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_39",
        aliases: &["76", "GPIO_76"],
        caps: Capability::DIGITAL,
        digital_logical: 76,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_40",
        aliases: &["77", "GPIO_77"],
        caps: Capability::DIGITAL,
        digital_logical: 77,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_41",
        aliases: &["74", "GPIO_74"],
        caps: Capability::DIGITAL,
        digital_logical: 74,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_42",
        aliases: &["75", "GPIO_75"],
        caps: Capability::DIGITAL,
        digital_logical: 75,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_43",
        aliases: &["72", "GPIO_72"],
        caps: Capability::DIGITAL,
        digital_logical: 72,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_44",
        aliases: &["73", "GPIO_73"],
        caps: Capability::DIGITAL,
        digital_logical: 73,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_45",
        aliases: &["70", "GPIO_70"],
        caps: Capability::DIGITAL,
        digital_logical: 70,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P8_46",
        aliases: &["71", "GPIO_71"],
        caps: Capability::DIGITAL,
        digital_logical: 71,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_11",
        aliases: &["30", "GPIO_30", "UART4_RXD"],
        caps: Capability::DIGITAL.union(Capability::UART),
        digital_logical: 30,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_12",
        aliases: &["60", "GPIO_60"],
        caps: Capability::DIGITAL,
        digital_logical: 60,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_13",
        aliases: &["31", "GPIO_31", "UART4_TXD"],
        caps: Capability::DIGITAL.union(Capability::UART),
        digital_logical: 31,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_14",
        aliases: &["50", "GPIO_50", "EHRPWM1A"],
        caps: Capability::DIGITAL.union(Capability::PWM),
        digital_logical: 50,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_15",
        aliases: &["48", "GPIO_48"],
        caps: Capability::DIGITAL,
        digital_logical: 48,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_16",
        aliases: &["51", "GPIO_51", "EHRPWM1B"],
        caps: Capability::DIGITAL.union(Capability::PWM),
        digital_logical: 51,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_17",
        aliases: &["5", "GPIO_5", "I2C1_SCL"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 5,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_18",
        aliases: &["4", "GPIO_4", "I2C1_SDA"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 4,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_19",
        aliases: &["13", "GPIO_13", "I2C2_SCL"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 13,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_20",
        aliases: &["12", "GPIO_12", "I2C2_SDA"],
        caps: Capability::DIGITAL.union(Capability::I2C),
        digital_logical: 12,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_21",
        aliases: &["3", "GPIO_3", "EHRPWM0B", "SPI0_D0"],
        caps: Capability::DIGITAL.union(Capability::PWM).union(Capability::SPI),
        digital_logical: 3,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_22",
        aliases: &["2", "GPIO_2", "EHRPWM0A", "SPI0_SCLK"],
        caps: Capability::DIGITAL.union(Capability::PWM).union(Capability::SPI),
        digital_logical: 2,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_23",
        aliases: &["49", "GPIO_49"],
        caps: Capability::DIGITAL,
        digital_logical: 49,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_24",
        aliases: &["15", "GPIO_15", "UART1_TXD"],
        caps: Capability::DIGITAL.union(Capability::UART),
        digital_logical: 15,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_25",
        aliases: &["117", "GPIO_117"],
        caps: Capability::DIGITAL,
        digital_logical: 117,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_26",
        aliases: &["14", "GPIO_14", "UART1_RXD"],
        caps: Capability::DIGITAL.union(Capability::UART),
        digital_logical: 14,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_27",
        aliases: &["115", "GPIO_115"],
        caps: Capability::DIGITAL,
        digital_logical: 115,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_28",
        aliases: &["113", "GPIO_113"],
        caps: Capability::DIGITAL,
        digital_logical: 113,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_29",
        aliases: &["111", "GPIO_111", "ECAPPWM0B"],
        caps: Capability::DIGITAL.union(Capability::PWM),
        digital_logical: 111,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_30",
        aliases: &["112", "GPIO_112"],
        caps: Capability::DIGITAL,
        digital_logical: 112,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_31",
        aliases: &["110", "GPIO_110", "ECAPPWM0A"],
        caps: Capability::DIGITAL.union(Capability::PWM),
        digital_logical: 110,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_41",
        aliases: &["20", "GPIO_20"],
        caps: Capability::DIGITAL,
        digital_logical: 20,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_42",
        aliases: &["7", "GPIO_7", "ECAPPWM0"],
        caps: Capability::DIGITAL.union(Capability::PWM),
        digital_logical: 7,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_39",
        aliases: &["AIN0"],
        caps: Capability::ANALOG,
        digital_logical: 0,
        analog_logical: 0,
    },
    PinDescriptor {
        id: "P9_40",
        aliases: &["AIN1"],
        caps: Capability::ANALOG,
        digital_logical: 0,
        analog_logical: 1,
    },
    PinDescriptor {
        id: "P9_37",
        aliases: &["AIN2"],
        caps: Capability::ANALOG,
        digital_logical: 0,
        analog_logical: 2,
    },
    PinDescriptor {
        id: "P9_38",
        aliases: &["AIN3"],
        caps: Capability::ANALOG,
        digital_logical: 0,
        analog_logical: 3,
    },
    PinDescriptor {
        id: "P9_33",
        aliases: &["AIN4"],
        caps: Capability::ANALOG,
        digital_logical: 0,
        analog_logical: 4,
    },
    PinDescriptor {
        id: "P9_36",
        aliases: &["AIN5"],
        caps: Capability::ANALOG,
        digital_logical: 0,
        analog_logical: 5,
    },
    PinDescriptor {
        id: "P9_35",
        aliases: &["AIN6"],
        caps: Capability::ANALOG,
        digital_logical: 0,
        analog_logical: 6,
    },
];

/// Header pin table.
pub static PINS: PinMap = PinMap::new(TABLE);

/// User LEDs.
pub static LEDS: LedMap = LedMap::new(&[
    LedDescriptor {
        id: "beaglebone:green:usr0",
        aliases: &["0", "USR0", "usr0"],
    },
    LedDescriptor {
        id: "beaglebone:green:usr1",
        aliases: &["1", "USR1", "usr1"],
    },
    LedDescriptor {
        id: "beaglebone:green:usr2",
        aliases: &["2", "USR2", "usr2"],
    },
    LedDescriptor {
        id: "beaglebone:green:usr3",
        aliases: &["3", "USR3", "usr3"],
    },
]);
