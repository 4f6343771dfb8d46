pub mod client;
pub mod storage;

pub use client::{AuthClient, LoginPayload, RegisteredUser};
pub use storage::{KeyringSecretStore, MemorySecretStore, SecretStore, TOKEN_KEY};
