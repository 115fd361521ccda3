pub mod authorizer;
pub mod context;
pub mod guard;
pub mod navigator;
pub mod service;
pub mod storage;
pub mod token;

pub use authorizer::BearerAuthorizer;
pub use context::SessionContext;
pub use guard::{GuardDecision, RouteGuard};
pub use navigator::{Location, MemoryRouter, Navigator};
pub use service::SessionService;
pub use storage::{FileStore, KeyValueStore, MemoryStore, TokenStore};
pub use token::{AuthState, LoginResponse, SessionSnapshot, UserRecord, Verification};
