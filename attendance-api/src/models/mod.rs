pub mod attendance;
pub mod course_request;
pub mod session;

// Re-export models for easier access
pub use attendance::*;
pub use course_request::*;
pub use session::*;
