pub mod config;
pub mod constants;
pub mod control;
pub mod device_manager;
pub mod error;
pub mod event_loop;
pub mod hwif;
pub mod source;
