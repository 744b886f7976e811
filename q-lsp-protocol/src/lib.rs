pub mod builtins;
pub mod convert;
pub mod handlers;
pub mod line_index;

pub use handlers::Handlers;
