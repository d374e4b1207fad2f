pub mod gate;
pub mod storage;

pub use {
    gate::{Credential, SessionGate, StaticSession, TokenSession},
    storage::{StoredToken, TokenStore, serialize_secret, unix_now},
};
