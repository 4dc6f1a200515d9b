pub mod access;
pub mod commands;
pub mod controller;
pub mod poller;
pub mod preferences;
pub mod tooltip;
