//! TXT metadata record set published with the discovery advertisement.
//!
//! Eight key-value records describe the accessory to controllers
//! browsing the network:
//!
//! | Key  | Meaning                                  |
//! |------|------------------------------------------|
//! | `c#` | configuration number                     |
//! | `ff` | feature flags                            |
//! | `id` | device identifier                        |
//! | `md` | model name                               |
//! | `pv` | protocol version `<major>.<minor>`       |
//! | `s#` | current state number                     |
//! | `sf` | status flags                             |
//! | `ci` | category identifier                      |
//!
//! The server passes these pairs verbatim to the discovery service; it
//! never interprets them itself.

use crate::domain::accessory::{AccessoryCategory, DeviceId, FeatureFlags, StatusFlags};

/// Typed builder for the advertisement's TXT records.
///
/// Values are held in their typed form and only formatted when
/// [`TxtRecordSet::pairs`] snapshots them, so a caller can bump the
/// state number or flip status flags without re-deriving the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxtRecordSet {
    configuration_number: u32,
    feature_flags: FeatureFlags,
    device_id: DeviceId,
    model_name: String,
    protocol_version: (u16, u16),
    state_number: u8,
    status_flags: StatusFlags,
    category: AccessoryCategory,
}

impl Default for TxtRecordSet {
    /// A freshly provisioned, unpaired accessory: configuration and
    /// state number 1, pairing supported, protocol version 1.0,
    /// placeholder identity.
    fn default() -> Self {
        Self {
            configuration_number: 1,
            feature_flags: FeatureFlags(FeatureFlags::SUPPORTS_PAIRING),
            device_id: DeviceId([0; 6]),
            model_name: "HAP1,1".to_string(),
            protocol_version: (1, 0),
            state_number: 1,
            status_flags: StatusFlags(StatusFlags::UNPAIRED),
            category: AccessoryCategory::Other,
        }
    }
}

impl TxtRecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `c#`, the configuration number.  Controllers re-fetch the
    /// accessory database when this changes.
    pub fn set_configuration_number(&mut self, v: u32) -> &mut Self {
        self.configuration_number = v;
        self
    }

    /// Sets `ff`, the feature flag bitmask.
    pub fn set_feature_flags(&mut self, v: FeatureFlags) -> &mut Self {
        self.feature_flags = v;
        self
    }

    /// Sets `id`, the device identifier.
    pub fn set_device_id(&mut self, v: DeviceId) -> &mut Self {
        self.device_id = v;
        self
    }

    /// Sets `md`, the model name (e.g. `"HAP1,1"`).
    pub fn set_model_name(&mut self, v: impl Into<String>) -> &mut Self {
        self.model_name = v.into();
        self
    }

    /// Sets `pv`, the protocol version.
    pub fn set_protocol_version(&mut self, major: u16, minor: u16) -> &mut Self {
        self.protocol_version = (major, minor);
        self
    }

    /// Sets `s#`, the current state number.
    pub fn set_state_number(&mut self, v: u8) -> &mut Self {
        self.state_number = v;
        self
    }

    /// Sets `sf`, the status flag bitmask.
    pub fn set_status_flags(&mut self, v: StatusFlags) -> &mut Self {
        self.status_flags = v;
        self
    }

    /// Sets `ci`, the category identifier.
    pub fn set_category(&mut self, v: AccessoryCategory) -> &mut Self {
        self.category = v;
        self
    }

    /// Formats the records as key-value pairs, in the fixed record
    /// order (`c#`, `ff`, `id`, `md`, `pv`, `s#`, `sf`, `ci`).
    pub fn pairs(&self) -> Vec<(String, String)> {
        let (major, minor) = self.protocol_version;
        vec![
            ("c#".into(), self.configuration_number.to_string()),
            ("ff".into(), self.feature_flags.0.to_string()),
            ("id".into(), self.device_id.to_string()),
            ("md".into(), self.model_name.clone()),
            ("pv".into(), format!("{major}.{minor}")),
            ("s#".into(), self.state_number.to_string()),
            ("sf".into(), self.status_flags.0.to_string()),
            ("ci".into(), (self.category as u8).to_string()),
        ]
    }
}
