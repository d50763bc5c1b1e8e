//! Domain model module declarations.

pub mod channel;
pub mod history;
pub mod setting;
pub mod task;
pub mod user;
