pub mod create_message;
pub mod deliver;
pub mod query;
pub mod schedule;
pub mod sweep;
