pub mod chat;
pub mod events;
pub mod export;
pub mod palette;
pub mod params;
