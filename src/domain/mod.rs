// Domain layer - Core models, no I/O
pub mod alert;
pub mod chart;
pub mod device;
pub mod session;
