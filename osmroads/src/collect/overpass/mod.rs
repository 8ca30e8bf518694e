//! Overpass API client: query building, transport, retry and the raw
//! element model of its JSON output.

pub mod elements;
pub mod overpass_collect;
pub mod query;
pub mod transport;

pub use elements::{ElementRecord, LatLon, RawElement, RawMember, RawResponse};
pub use overpass_collect::{FetchConfig, FetchError, OverpassCollect};
pub use query::build_query;
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{Sleeper, ThreadSleeper, Transport, TransportError};
