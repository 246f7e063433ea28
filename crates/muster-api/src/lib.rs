// muster-api: async client capability for Juju-style cluster management APIs

pub mod client;
pub mod endpoint;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{ClusterClient, ClusterConnect, HttpClient, HttpConnector};
pub use endpoint::ControllerEndpoint;
pub use error::Error;
pub use transport::TransportConfig;
pub use types::{
    Address, ApplicationDetail, CloudDetail, MachineDetail, ModelDetail, ModelInfo, UnitDetail,
};
