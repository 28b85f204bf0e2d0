//! Accessory identity and classification types.
//!
//! These feed the TXT metadata records in [`crate::domain::txt`]; the
//! numeric values are protocol-visible (controllers filter on them
//! before ever opening a TCP connection), so each type pins its wire
//! representation explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ── Category identifiers ──────────────────────────────────────────────────────

/// Accessory category identifier, published as the `ci` TXT record.
///
/// Controllers use the category purely for display (which icon to
/// show); it carries no behavioural contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum AccessoryCategory {
    Other = 1,
    Bridge = 2,
    Fan = 3,
    GarageDoorOpener = 4,
    Lightbulb = 5,
    DoorLock = 6,
    Outlet = 7,
    Switch = 8,
    Thermostat = 9,
    Sensor = 10,
    SecuritySystem = 11,
    Door = 12,
    Window = 13,
    WindowCovering = 14,
    ProgrammableSwitch = 15,
    RangeExtender = 16,
    IpCamera = 17,
    VideoDoorbell = 18,
    AirPurifier = 19,
}

impl TryFrom<u8> for AccessoryCategory {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use AccessoryCategory::*;
        match value {
            1 => Ok(Other),
            2 => Ok(Bridge),
            3 => Ok(Fan),
            4 => Ok(GarageDoorOpener),
            5 => Ok(Lightbulb),
            6 => Ok(DoorLock),
            7 => Ok(Outlet),
            8 => Ok(Switch),
            9 => Ok(Thermostat),
            10 => Ok(Sensor),
            11 => Ok(SecuritySystem),
            12 => Ok(Door),
            13 => Ok(Window),
            14 => Ok(WindowCovering),
            15 => Ok(ProgrammableSwitch),
            16 => Ok(RangeExtender),
            17 => Ok(IpCamera),
            18 => Ok(VideoDoorbell),
            19 => Ok(AirPurifier),
            _ => Err(()),
        }
    }
}

// ── Status flags ──────────────────────────────────────────────────────────────

/// Status flag bitmask, published as the `sf` TXT record.
///
/// An accessory advertising [`StatusFlags::UNPAIRED`] is open for
/// pairing; a cleared mask means paired and reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusFlags(pub u8);

impl StatusFlags {
    /// The accessory has not been paired with any controller.
    pub const UNPAIRED: u8 = 0x01;
    /// The accessory has not been configured to join a network.
    pub const NOT_CONFIGURED: u8 = 0x02;
    /// A problem has been detected on the accessory.
    pub const PROBLEM: u8 = 0x04;

    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }
}

// ── Feature flags ─────────────────────────────────────────────────────────────

/// Feature flag bitmask, published as the `ff` TXT record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags(pub u8);

impl FeatureFlags {
    /// The accessory supports pairing.
    pub const SUPPORTS_PAIRING: u8 = 0x01;
}

// ── Device identifier ─────────────────────────────────────────────────────────

/// Error parsing a [`DeviceId`] from its textual form.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid device id {0:?}: expected six colon-separated hex octets")]
pub struct DeviceIdParseError(String);

/// Six-octet device identifier, published as the `id` TXT record.
///
/// Formatted as lowercase colon-separated hex
/// (`c4:b3:01:c3:f7:9d`), the same shape as a MAC address.  Identity
/// only — it is never interpreted as an actual hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(pub [u8; 6]);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for DeviceId {
    type Err = DeviceIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in &mut octets {
            let part = parts
                .next()
                .ok_or_else(|| DeviceIdParseError(s.to_string()))?;
            *octet =
                u8::from_str_radix(part, 16).map_err(|_| DeviceIdParseError(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(DeviceIdParseError(s.to_string()));
        }
        Ok(DeviceId(octets))
    }
}

impl TryFrom<String> for DeviceId {
    type Error = DeviceIdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_u8() {
        for v in 1..=19u8 {
            let category = AccessoryCategory::try_from(v).unwrap();
            assert_eq!(category as u8, v);
        }
    }

    #[test]
    fn test_category_rejects_unknown_values() {
        assert!(AccessoryCategory::try_from(0).is_err());
        assert!(AccessoryCategory::try_from(20).is_err());
        assert!(AccessoryCategory::try_from(255).is_err());
    }

    #[test]
    fn test_status_flags_contains() {
        let flags = StatusFlags(StatusFlags::UNPAIRED | StatusFlags::PROBLEM);
        assert!(flags.contains(StatusFlags::UNPAIRED));
        assert!(flags.contains(StatusFlags::PROBLEM));
        assert!(!flags.contains(StatusFlags::NOT_CONFIGURED));
    }

    #[test]
    fn test_device_id_formats_as_colon_separated_hex() {
        let id = DeviceId([0xc4, 0xb3, 0x01, 0xc3, 0xf7, 0x9d]);
        assert_eq!(id.to_string(), "c4:b3:01:c3:f7:9d");
    }

    #[test]
    fn test_device_id_parses_its_own_output() {
        let id = DeviceId([0x00, 0x11, 0x22, 0xaa, 0xbb, 0xcc]);
        let parsed: DeviceId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_device_id_rejects_malformed_input() {
        assert!("".parse::<DeviceId>().is_err());
        assert!("c4:b3:01:c3:f7".parse::<DeviceId>().is_err());
        assert!("c4:b3:01:c3:f7:9d:00".parse::<DeviceId>().is_err());
        assert!("zz:b3:01:c3:f7:9d".parse::<DeviceId>().is_err());
    }
}
