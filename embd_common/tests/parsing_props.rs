//! Property tests for kernel version parsing and pin-map lookup.

use embd_common::host::KernelVersion;
use embd_common::pin::{Capability, PinDescriptor, PinMap};
use proptest::prelude::*;

static PINS: &[PinDescriptor] = &[
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
        id: "P9_39",
        aliases: &["AIN0"],
        caps: Capability::ANALOG,
        digital_logical: 0,
        analog_logical: 0,
    },
];

const MAP: PinMap = PinMap::new(PINS);

proptest! {
    #[test]
    fn kernel_version_formats_canonically(
        major in 0u32..100,
        minor in 0u32..100,
        patch in proptest::option::of(0u32..1000),
        suffix in prop_oneof![Just(""), Just("+"), Just("-v7+"), Just("-bone47"), Just("-1034-raspi")],
    ) {
        let release = match patch {
            Some(patch) => format!("{major}.{minor}.{patch}{suffix}"),
            None => format!("{major}.{minor}{suffix}"),
        };
        let parsed = KernelVersion::parse(&release).unwrap();
        prop_assert_eq!(parsed.to_string(), format!("{major}.{minor}.{}", patch.unwrap_or(0)));
    }

    #[test]
    fn any_key_of_a_pin_yields_that_pin(index in 0usize..3, which in 0usize..5) {
        let pin = &PINS[index];
        let keys: Vec<&str> = std::iter::once(pin.id).chain(pin.aliases.iter().copied()).collect();
        let key = keys[which % keys.len()];
        prop_assert_eq!(MAP.lookup(key, None).unwrap().id, pin.id);
        prop_assert_eq!(MAP.lookup(key, Some(pin.caps)).unwrap().id, pin.id);
    }

    #[test]
    fn capability_filter_never_returns_ineligible_pin(key in "[A-Z0-9_]{1,8}", bit in 0u16..8) {
        let cap = Capability::from_bits_truncate(1 << bit);
        if let Some(pin) = MAP.lookup(&key, Some(cap)) {
            prop_assert!(pin.caps.intersects(cap));
        }
    }
}
