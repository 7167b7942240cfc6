//! Bluetooth Low Energy transport layer

pub mod adapter;
pub mod characteristics;
pub mod gatt;
pub mod uuids;

pub use {
    adapter::BleAdapter, characteristics::CharacteristicHandler, gatt::GattServer, uuids::*,
};
