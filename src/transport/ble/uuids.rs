//! Improv BLE GATT UUIDs

use uuid::Uuid;

/// Improv provisioning service
pub const IMPROV_SERVICE_UUID: Uuid = Uuid::from_u128(0x00467768_6228_2272_4663_277478268000);

/// Current state (read, notify)
pub const CURRENT_STATE_CHAR_UUID: Uuid = Uuid::from_u128(0x00467768_6228_2272_4663_277478268001);

/// Error state (read, notify)
pub const ERROR_STATE_CHAR_UUID: Uuid = Uuid::from_u128(0x00467768_6228_2272_4663_277478268002);

/// RPC command (write)
pub const RPC_COMMAND_CHAR_UUID: Uuid = Uuid::from_u128(0x00467768_6228_2272_4663_277478268003);

/// RPC result (read, notify)
pub const RPC_RESULT_CHAR_UUID: Uuid = Uuid::from_u128(0x00467768_6228_2272_4663_277478268004);

/// Capabilities (read)
pub const CAPABILITIES_CHAR_UUID: Uuid = Uuid::from_u128(0x00467768_6228_2272_4663_277478268005);

/// 16-bit service data UUID 0x4677 on the Bluetooth base UUID
pub const SERVICE_DATA_UUID: Uuid = Uuid::from_u128(0x00004677_0000_1000_8000_00805f9b34fb);
