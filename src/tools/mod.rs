pub mod definitions;
pub mod dispatcher;
pub mod types;

pub use definitions::load_builtin_tools;
pub use dispatcher::dispatch;
