//! Permissions bitmask for access certificates.
//!
//! The access certificate format reserves a permissions field whose first
//! byte identifies the permission scheme (`0x10`), followed by payload bytes
//! in which every bit grants one capability. The bit layout is a wire
//! contract shared with the certificate consumer: moving a bit changes the
//! meaning of every certificate issued with it.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::BridgeError;

/// Identifier byte that starts every encoded permission set.
pub const PERMISSIONS_IDENTIFIER: u8 = 0x10;

/// Number of payload bytes following the identifier.
const PAYLOAD_BYTES: usize = 6;

/// A single grantable capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CertificatesRead,
    CertificatesWrite,
    ResetWrite,

    CapabilitiesRead,
    VehicleStatusRead,
    DiagnosticsRead,
    DoorLocksRead,
    DoorLocksWrite,
    EngineRead,
    EngineWrite,
    TrunkAccessRead,

    TrunkAccessWrite,
    /// Trunk access is limited to a single use.
    TrunkAccessLimited,
    WakeUpWrite,
    ChargeRead,
    ChargeWrite,
    ClimateRead,
    ClimateWrite,
    LightsRead,

    LightsWrite,
    WindowsWrite,
    RooftopControlRead,
    RooftopControlWrite,
    WindscreenRead,
    WindscreenWrite,
    HonkHornFlashLightsWrite,
    HeadunitWrite,

    RemoteControlRead,
    RemoteControlWrite,
    ValetModeRead,
    ValetModeWrite,
    /// The holder may only use the vehicle in valet mode.
    ValetModeActive,
    FuelingWrite,
    HeartRateWrite,
    DriverFatigueRead,

    VehicleLocationRead,
    NaviDestinationWrite,
    TheftAlarmRead,
    TheftAlarmWrite,
    ParkingTicketRead,
    ParkingTicketWrite,
    KeyfobPositionRead,
    HeadunitRead,
}

use Permission::*;

/// Payload layout, one row per byte, listed from bit 7 down to bit 0.
const LAYOUT: [[Option<Permission>; 8]; PAYLOAD_BYTES] = [
    [
        None,
        None,
        None,
        None,
        None,
        Some(ResetWrite),
        Some(CertificatesWrite),
        Some(CertificatesRead),
    ],
    [
        Some(TrunkAccessRead),
        Some(EngineWrite),
        Some(EngineRead),
        Some(DoorLocksWrite),
        Some(DoorLocksRead),
        Some(DiagnosticsRead),
        Some(VehicleStatusRead),
        Some(CapabilitiesRead),
    ],
    [
        Some(LightsRead),
        Some(ClimateWrite),
        Some(ClimateRead),
        Some(ChargeWrite),
        Some(ChargeRead),
        Some(WakeUpWrite),
        Some(TrunkAccessLimited),
        Some(TrunkAccessWrite),
    ],
    [
        Some(HeadunitWrite),
        Some(HonkHornFlashLightsWrite),
        Some(WindscreenWrite),
        Some(WindscreenRead),
        Some(RooftopControlWrite),
        Some(RooftopControlRead),
        Some(WindowsWrite),
        Some(LightsWrite),
    ],
    [
        Some(DriverFatigueRead),
        Some(HeartRateWrite),
        Some(FuelingWrite),
        Some(ValetModeActive),
        Some(ValetModeWrite),
        Some(ValetModeRead),
        Some(RemoteControlWrite),
        Some(RemoteControlRead),
    ],
    [
        Some(HeadunitRead),
        Some(KeyfobPositionRead),
        Some(ParkingTicketWrite),
        Some(ParkingTicketRead),
        Some(TheftAlarmWrite),
        Some(TheftAlarmRead),
        Some(NaviDestinationWrite),
        Some(VehicleLocationRead),
    ],
];

impl Permission {
    /// Every capability, in declaration order.
    pub const ALL: [Permission; 43] = [
        CertificatesRead,
        CertificatesWrite,
        ResetWrite,
        CapabilitiesRead,
        VehicleStatusRead,
        DiagnosticsRead,
        DoorLocksRead,
        DoorLocksWrite,
        EngineRead,
        EngineWrite,
        TrunkAccessRead,
        TrunkAccessWrite,
        TrunkAccessLimited,
        WakeUpWrite,
        ChargeRead,
        ChargeWrite,
        ClimateRead,
        ClimateWrite,
        LightsRead,
        LightsWrite,
        WindowsWrite,
        RooftopControlRead,
        RooftopControlWrite,
        WindscreenRead,
        WindscreenWrite,
        HonkHornFlashLightsWrite,
        HeadunitWrite,
        RemoteControlRead,
        RemoteControlWrite,
        ValetModeRead,
        ValetModeWrite,
        ValetModeActive,
        FuelingWrite,
        HeartRateWrite,
        DriverFatigueRead,
        VehicleLocationRead,
        NaviDestinationWrite,
        TheftAlarmRead,
        TheftAlarmWrite,
        ParkingTicketRead,
        ParkingTicketWrite,
        KeyfobPositionRead,
        HeadunitRead,
    ];

    /// The snake_case name used in configuration and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            CertificatesRead => "certificates_read",
            CertificatesWrite => "certificates_write",
            ResetWrite => "reset_write",
            CapabilitiesRead => "capabilities_read",
            VehicleStatusRead => "vehicle_status_read",
            DiagnosticsRead => "diagnostics_read",
            DoorLocksRead => "door_locks_read",
            DoorLocksWrite => "door_locks_write",
            EngineRead => "engine_read",
            EngineWrite => "engine_write",
            TrunkAccessRead => "trunk_access_read",
            TrunkAccessWrite => "trunk_access_write",
            TrunkAccessLimited => "trunk_access_limited",
            WakeUpWrite => "wake_up_write",
            ChargeRead => "charge_read",
            ChargeWrite => "charge_write",
            ClimateRead => "climate_read",
            ClimateWrite => "climate_write",
            LightsRead => "lights_read",
            LightsWrite => "lights_write",
            WindowsWrite => "windows_write",
            RooftopControlRead => "rooftop_control_read",
            RooftopControlWrite => "rooftop_control_write",
            WindscreenRead => "windscreen_read",
            WindscreenWrite => "windscreen_write",
            HonkHornFlashLightsWrite => "honk_horn_flash_lights_write",
            HeadunitWrite => "headunit_write",
            RemoteControlRead => "remote_control_read",
            RemoteControlWrite => "remote_control_write",
            ValetModeRead => "valet_mode_read",
            ValetModeWrite => "valet_mode_write",
            ValetModeActive => "valet_mode_active",
            FuelingWrite => "fueling_write",
            HeartRateWrite => "heart_rate_write",
            DriverFatigueRead => "driver_fatigue_read",
            VehicleLocationRead => "vehicle_location_read",
            NaviDestinationWrite => "navi_destination_write",
            TheftAlarmRead => "theft_alarm_read",
            TheftAlarmWrite => "theft_alarm_write",
            ParkingTicketRead => "parking_ticket_read",
            ParkingTicketWrite => "parking_ticket_write",
            KeyfobPositionRead => "keyfob_position_read",
            HeadunitRead => "headunit_read",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Permission {
    type Err = BridgeError;

    /// Accepts snake_case or kebab-case names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_lowercase();
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.name() == normalized)
            .ok_or_else(|| BridgeError::InvalidArgument(format!("unknown permission: {s}")))
    }
}

/// A set of granted capabilities.
///
/// Any subset is valid; the codec enforces no exclusions between flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions {
    granted: BTreeSet<Permission>,
}

impl Permissions {
    /// No capabilities granted.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every capability granted.
    pub fn all() -> Self {
        Permission::ALL.into_iter().collect()
    }

    /// Add a capability, returning the updated set.
    pub fn with(mut self, permission: Permission) -> Self {
        self.granted.insert(permission);
        self
    }

    pub fn grant(&mut self, permission: Permission) {
        self.granted.insert(permission);
    }

    pub fn revoke(&mut self, permission: Permission) {
        self.granted.remove(&permission);
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.granted.iter().copied()
    }

    /// Encode as the identifier byte followed by the payload bytes.
    pub fn to_bytes(&self) -> [u8; PAYLOAD_BYTES + 1] {
        let mut bytes = [0u8; PAYLOAD_BYTES + 1];
        bytes[0] = PERMISSIONS_IDENTIFIER;
        for (row, byte) in LAYOUT.iter().zip(bytes[1..].iter_mut()) {
            *byte = pack_byte(row, &self.granted);
        }
        bytes
    }

    /// Encode as uppercase hex, the form passed to the access command.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.to_bytes())
    }
}

/// Pack one payload byte; `row[0]` is bit 7.
fn pack_byte(row: &[Option<Permission>; 8], granted: &BTreeSet<Permission>) -> u8 {
    row.iter().enumerate().fold(0u8, |acc, (i, slot)| match slot {
        Some(p) if granted.contains(p) => acc | (1 << (7 - i)),
        _ => acc,
    })
}

impl FromIterator<Permission> for Permissions {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self {
            granted: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_PERMISSIONS_HEX: &str = "10000000000000";
    const STANDARD_PERMISSIONS_HEX: &str = "10001F08000040";
    const ALL_PERMISSIONS_HEX: &str = "1007FFFFFFFFFF";

    #[test]
    fn none_is_identifier_and_zero_payload() {
        assert_eq!(Permissions::none().to_hex(), EMPTY_PERMISSIONS_HEX);
    }

    #[test]
    fn standard_subset_encoding() {
        let permissions: Permissions = [
            DiagnosticsRead,
            DoorLocksRead,
            DoorLocksWrite,
            KeyfobPositionRead,
            CapabilitiesRead,
            VehicleStatusRead,
            ChargeRead,
        ]
        .into_iter()
        .collect();
        assert_eq!(permissions.to_hex(), STANDARD_PERMISSIONS_HEX);
    }

    #[test]
    fn all_flags_encoding() {
        assert_eq!(Permissions::all().to_hex(), ALL_PERMISSIONS_HEX);
    }

    #[test]
    fn every_flag_occupies_exactly_one_bit() {
        for permission in Permission::ALL {
            let bytes = Permissions::none().with(permission).to_bytes();
            let set_bits: u32 = bytes[1..].iter().map(|b| b.count_ones()).sum();
            assert_eq!(set_bits, 1, "{permission} should set a single bit");
        }

        let mut seen = BTreeSet::new();
        for row in LAYOUT.iter() {
            for p in row.iter().flatten() {
                assert!(seen.insert(*p), "{p} appears twice in the layout");
            }
        }
        assert_eq!(seen.len(), Permission::ALL.len());
    }

    #[test]
    fn encoding_length_is_fixed() {
        let mut permissions = Permissions::none();
        for (i, permission) in Permission::ALL.into_iter().enumerate() {
            if i % 3 == 0 {
                permissions.grant(permission);
            }
            let hex = permissions.to_hex();
            assert_eq!(hex.len(), EMPTY_PERMISSIONS_HEX.len());
            assert!(hex.starts_with("10"));
        }
    }

    #[test]
    fn bit_seven_is_most_significant() {
        let trunk = Permissions::none().with(TrunkAccessRead).to_bytes();
        assert_eq!(trunk[2], 0x80);
        let caps = Permissions::none().with(CapabilitiesRead).to_bytes();
        assert_eq!(caps[2], 0x01);
        let reset = Permissions::none().with(ResetWrite).to_bytes();
        assert_eq!(reset[1], 0x04);
    }

    #[test]
    fn revoke_clears_bit() {
        let mut permissions = Permissions::all();
        permissions.revoke(HeadunitRead);
        assert!(!permissions.contains(HeadunitRead));
        assert_eq!(permissions.to_hex(), "1007FFFFFFFF7F");
    }

    #[test]
    fn names_parse_back() {
        for permission in Permission::ALL {
            assert_eq!(permission.name().parse::<Permission>().unwrap(), permission);
        }
        assert_eq!(
            "door-locks-write".parse::<Permission>().unwrap(),
            DoorLocksWrite
        );
        assert!("teleport_write".parse::<Permission>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let permissions = Permissions::none().with(HonkHornFlashLightsWrite);
        let json = serde_json::to_string(&permissions).unwrap();
        assert_eq!(json, r#"["honk_horn_flash_lights_write"]"#);
        let back: Permissions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, permissions);
    }
}
