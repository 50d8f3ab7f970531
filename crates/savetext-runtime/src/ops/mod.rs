pub mod maintenance;

pub use maintenance::{MaintenanceProgress, maintain};
