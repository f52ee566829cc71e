pub mod cache;
pub mod connector;
pub mod error;
pub mod handle;
pub mod options;
pub mod rows;
pub mod sequence;

pub use cache::ConnectionCache;
pub use connector::{Connector, PgConnector};
pub use error::DatabaseError;
pub use handle::{ConnectionHandle, HandleState, Lifecycle};
pub use options::ConnectionTemplate;
