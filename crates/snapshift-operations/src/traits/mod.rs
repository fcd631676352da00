mod clock;
mod cluster_client;

pub use clock::Clock;
pub use cluster_client::ClusterResourceClient;
