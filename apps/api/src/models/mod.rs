pub mod application;
pub mod audition;
pub mod forum;
pub mod messaging;
pub mod notification;
pub mod profile;
pub mod project;
