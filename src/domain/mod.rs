pub mod notification;
pub mod profile;
