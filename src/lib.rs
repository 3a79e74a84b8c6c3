// Metapackage for cross-crate tests
// Re-export the workspace members as modules

pub use account_service;
pub use api_server;
pub use auth_service;
pub use common;
