//! CLI command implementations

pub mod add_safe;
pub mod address;
pub mod keygen;
pub mod message;
pub mod owners;
pub mod recover;
pub mod register;
pub mod safes;
pub mod share;
