//! Unix domain socket control channel

pub mod handler;
pub mod server;
pub mod session;

pub use {
    handler::RequestHandler,
    server::{UnixSocketServer, bind_listener, inherited_listener},
    session::{SessionReader, UnixSocketSession},
};
