pub mod handlers;
pub mod threads;
