pub mod conversations;
pub mod handlers;
