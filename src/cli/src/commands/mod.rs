pub mod check;
pub mod config;
pub mod guard;
pub mod health;
pub mod nav;
pub mod roles;
