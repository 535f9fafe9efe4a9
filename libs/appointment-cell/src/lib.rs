pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::booking::AppointmentScheduler;
pub use services::queue::QueueCounterService;
