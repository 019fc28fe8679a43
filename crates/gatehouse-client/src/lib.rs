//! Gatehouse client
//!
//! Caches the signed-in `{token, user}` pair, publishes session changes to
//! subscribers and gates protected views behind the session.

pub mod api;
pub mod guard;
pub mod session;
pub mod storage;

pub use api::{AuthApi, AuthPayload, ClientError, HttpAuthApi, RegisterForm, UserSummary};
pub use guard::{Navigation, Navigator, RouteGuard, LOGIN_PATH};
pub use session::{Session, SessionState};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError, TOKEN_KEY, USER_KEY};
