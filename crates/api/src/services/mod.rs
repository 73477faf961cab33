//! Domain services shared by handlers

pub mod import;
pub mod pm;
