// trafficdeck-api: Async client for the traffic-operations data backend (REST + realtime)

pub mod error;
pub mod models;
pub mod query;
pub mod realtime;
pub mod rest;
pub mod transport;

pub use error::Error;
pub use models::{AlertRecord, IntersectionRecord};
pub use query::Query;
pub use realtime::{ChangeSignal, ReconnectConfig, RealtimeHandle};
pub use rest::RestClient;
pub use transport::{TlsMode, TransportConfig};
