mod bin;
pub mod address;
pub mod associative;
pub mod cache;
pub mod config;
pub mod direct_mapped;
pub mod dispatch;
pub mod io;
pub mod sim;
pub mod statistics;
pub mod trace;

#[cfg(feature = "stat")]
pub mod stat;
