pub mod seed;
pub mod show;
pub mod status;
pub mod verify;
