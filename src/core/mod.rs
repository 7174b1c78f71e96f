/// Core Server Framework Module
///
/// - schema.rs: field descriptors and the argument validator
/// - registry.rs: read-only catalog of tool definitions
/// - dispatcher.rs: handler table, call pipeline, result normalization
/// - error.rs: typed tool and registry errors
/// - protocol.rs: JSON-RPC 2.0 envelope and method routing
/// - server.rs: HTTP and STDIO transports
/// - config.rs: environment and kmcp.yaml configuration
/// - logging.rs: tracing subscriber setup

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod server;
