//! API handlers module

pub mod assets;
pub mod auth;
pub mod health;
pub mod inventory;
pub mod purchase_orders;
pub mod requests;
pub mod schedules;
pub mod stores;
pub mod technicians;
pub mod transfers;
pub mod uploads;
pub mod users;
pub mod vendors;
pub mod workorders;
