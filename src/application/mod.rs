pub mod chart_session;
pub mod coordinator;
pub mod overlay_manager;

pub use chart_session::*;
pub use coordinator::*;
pub use overlay_manager::*;
