pub mod kv;
pub mod remote;
pub mod store;

pub use kv::{KeyValueStore, SqliteKvStore, LOCATIONS_KEY, USER_KEY};
pub use remote::{HttpLocationSync, LocationSync};
pub use store::{Session, SessionError, SessionStore, MAX_LOCATIONS};
