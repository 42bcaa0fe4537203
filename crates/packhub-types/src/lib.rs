pub mod api;
pub mod models;

pub use api::{ErrorBody, ListParams, PackList, PublishPackRequest, RegisterRequest};
pub use models::{Memo, Pack, PackKind, Rule, ServerInfo, User};
