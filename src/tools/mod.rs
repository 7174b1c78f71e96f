/// Tools Module
///
/// This module contains all MCP tool implementations. Each tool is implemented
/// as a separate module that exports a `register` function adding its
/// definition and handler to the tool set during server initialization.

use crate::core::config::ToolConfig;
use crate::core::dispatcher::{Dispatcher, ToolSetBuilder};
use crate::core::error::RegistryError;

pub mod custom;
pub mod echo;

/// Register every tool and freeze the set.
///
/// Add new tool registrations here following this pattern:
/// `your_tool::register(&mut builder, config);`
pub fn initialize_tools(config: &ToolConfig) -> Result<Dispatcher, RegistryError> {
    let mut builder = ToolSetBuilder::new();
    custom::register(&mut builder, config);
    echo::register(&mut builder, config);
    builder.build()
}
