pub mod channels;
pub mod error;
pub mod http;
pub mod local;

pub use channels::{Channel, ChannelSet, RemotePack};
pub use error::ClientError;
pub use http::ApiClient;
pub use local::LocalStore;
