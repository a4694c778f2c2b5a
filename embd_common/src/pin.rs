//! Pin descriptors, capability bits and pin-map lookup.
//!
//! A [`PinMap`] is the static description of one board revision's header.
//! Lookup accepts anything that renders to a string, so `10`, `"10"` and
//! `String::from("10")` all resolve to the same descriptor.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Functions a physical pin can serve.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capability: u16 {
        /// General purpose digital I/O.
        const DIGITAL = 0x0001;
        /// I²C data/clock line.
        const I2C     = 0x0002;
        /// UART TX/RX.
        const UART    = 0x0004;
        /// SPI line.
        const SPI     = 0x0008;
        /// General purpose memory controller line.
        const GPMC    = 0x0010;
        /// LCD controller line.
        const LCD     = 0x0020;
        /// Hardware PWM output.
        const PWM     = 0x0040;
        /// ADC input.
        const ANALOG  = 0x0080;
    }
}

const CAPABILITY_NAMES: [(Capability, &str); 8] = [
    (Capability::DIGITAL, "digital"),
    (Capability::I2C, "i2c"),
    (Capability::UART, "uart"),
    (Capability::SPI, "spi"),
    (Capability::GPMC, "gpmc"),
    (Capability::LCD, "lcd"),
    (Capability::PWM, "pwm"),
    (Capability::ANALOG, "analog"),
];

impl Capability {
    /// Short lowercase name of a single capability bit (`"digital"`, ...).
    ///
    /// Returns `"mixed"` for a mask with more or less than one bit set.
    pub fn name(self) -> &'static str {
        CAPABILITY_NAMES
            .iter()
            .find(|(cap, _)| *cap == self)
            .map_or("mixed", |(_, name)| name)
    }
}

/// Immutable metadata for one physical pin. Identity is the `id`.
#[derive(Debug, Clone, Copy)]
pub struct PinDescriptor {
    /// Canonical identifier, e.g. `P1_12` or `P9_14`.
    pub id: &'static str,
    /// Secondary names: kernel numbers rendered as strings, function names.
    pub aliases: &'static [&'static str],
    /// Capability mask.
    pub caps: Capability,
    /// Kernel GPIO number.
    pub digital_logical: u32,
    /// Kernel ADC channel.
    pub analog_logical: u32,
}

impl PinDescriptor {
    /// True if `key` is the id or one of the aliases.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.aliases.iter().any(|alias| *alias == key)
    }

    /// True if every bit of `cap` is present in this pin's mask.
    pub fn supports(&self, cap: Capability) -> bool {
        self.caps.contains(cap)
    }
}

impl PartialEq for PinDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PinDescriptor {}

impl std::hash::Hash for PinDescriptor {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for PinDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id)
    }
}

/// Ordered pin descriptors of one board revision.
#[derive(Debug, Clone, Copy)]
pub struct PinMap {
    pins: &'static [PinDescriptor],
}

impl PinMap {
    /// Wrap a static descriptor table.
    pub const fn new(pins: &'static [PinDescriptor]) -> Self {
        Self { pins }
    }

    /// Find the first descriptor whose id or alias equals `key`.
    ///
    /// When `cap` is given, descriptors lacking that capability are skipped,
    /// so an alias shared between two pins resolves to the one that can serve
    /// the request.
    pub fn lookup<K: fmt::Display>(&self, key: K, cap: Option<Capability>) -> Option<&'static PinDescriptor> {
        let key = key.to_string();
        self.pins
            .iter()
            .filter(|pin| cap.is_none_or(|cap| pin.caps.intersects(cap)))
            .find(|pin| pin.matches(&key))
    }

    /// Iterate in header order.
    pub fn iter(&self) -> std::slice::Iter<'static, PinDescriptor> {
        self.pins.iter()
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// True if the map holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static PINS: &[PinDescriptor] = &[
        PinDescriptor {
            id: "P1_1",
            aliases: &["AN1", "10"],
            caps: Capability::DIGITAL,
            digital_logical: 10,
            analog_logical: 0,
        },
        PinDescriptor {
            id: "P1_2",
            aliases: &["GPIO10"],
            caps: Capability::DIGITAL,
            digital_logical: 11,
            analog_logical: 0,
        },
        PinDescriptor {
            id: "P1_3",
            aliases: &["AIN0", "shared"],
            caps: Capability::ANALOG,
            digital_logical: 0,
            analog_logical: 0,
        },
        PinDescriptor {
            id: "P1_4",
            aliases: &["shared"],
            caps: Capability::DIGITAL.union(Capability::PWM),
            digital_logical: 12,
            analog_logical: 0,
        },
    ];

    const MAP: PinMap = PinMap::new(PINS);

    #[test]
    fn lookup_by_string_alias() {
        assert_eq!(MAP.lookup("10", None).unwrap().id, "P1_1");
    }

    #[test]
    fn lookup_by_integer() {
        assert_eq!(MAP.lookup(10, None).unwrap().id, "P1_1");
    }

    #[test]
    fn lookup_by_id_and_secondary_name() {
        assert_eq!(MAP.lookup("P1_2", None).unwrap().id, "P1_2");
        assert_eq!(MAP.lookup("GPIO10", None).unwrap().id, "P1_2");
    }

    #[test]
    fn lookup_miss() {
        assert!(MAP.lookup("missing", None).is_none());
    }

    #[test]
    fn capability_filter_skips_ineligible_pins() {
        assert_eq!(MAP.lookup("shared", None).unwrap().id, "P1_3");
        assert_eq!(
            MAP.lookup("shared", Some(Capability::PWM)).unwrap().id,
            "P1_4"
        );
        assert!(MAP.lookup("AIN0", Some(Capability::DIGITAL)).is_none());
    }

    #[test]
    fn every_alias_resolves_to_the_same_descriptor() {
        for pin in MAP.iter() {
            assert_eq!(MAP.lookup(pin.id, Some(pin.caps)).unwrap(), pin);
            for alias in pin.aliases {
                assert_eq!(MAP.lookup(alias, Some(pin.caps)).unwrap(), pin);
            }
        }
    }

    #[test]
    fn capability_names() {
        assert_eq!(Capability::ANALOG.name(), "analog");
        assert_eq!((Capability::DIGITAL | Capability::PWM).name(), "mixed");
    }
}
