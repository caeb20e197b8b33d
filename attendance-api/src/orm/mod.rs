pub mod attendance;
pub mod course_request;
mod db;
pub mod testing;

pub use db::*;
