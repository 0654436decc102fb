pub mod events;
pub mod kitchen;
pub mod pickup;
