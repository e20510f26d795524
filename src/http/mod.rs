//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → connect.rs (capture ConnInfo per accepted connection)
//!     → middleware (bind ConnInfo into the request Context)
//!     → server.rs handlers (read ConnInfo back from the Context)
//!     → response.rs (JSON view of the connection)
//! ```

pub mod connect;
pub mod middleware;
pub mod response;
pub mod server;

pub use response::{TlsSummary, WhoAmI};
pub use server::HttpServer;
