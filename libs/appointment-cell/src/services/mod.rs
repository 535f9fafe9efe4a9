pub mod booking;
pub mod queue;

pub use booking::AppointmentScheduler;
pub use queue::QueueCounterService;
