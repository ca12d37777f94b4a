//! IPC module for the start trigger, status queries and notifications

mod protocol;
mod server;

pub use server::Server;
