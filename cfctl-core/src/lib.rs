pub mod alias;
pub mod binder;
pub mod codec;
pub mod connection;
pub mod descriptor;
pub mod endpoint;
pub mod error;
pub mod fetch;
pub mod format;
pub mod invoke;
pub mod metadata;
pub mod reflection;
pub mod render;
pub mod response;
pub mod settings;
pub mod watch;
