//! Request middleware.

pub mod conn_info;

pub use conn_info::bind_conn_info;
