pub mod cmd;
pub mod contexts;
pub mod endpoint;
pub mod error;
pub mod hookenv;
pub mod hooks;
pub mod host;
pub mod openstack;
pub mod relations;
pub mod render;
pub mod utils;
