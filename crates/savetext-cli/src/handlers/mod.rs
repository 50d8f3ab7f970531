pub mod config;
pub mod load;
pub mod maintain;
pub mod read;
pub mod titles;
pub mod watch;
