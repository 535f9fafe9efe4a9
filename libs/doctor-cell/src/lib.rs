pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::doctor::DoctorService;
pub use services::shift_manager::DoctorShiftManager;
pub use services::shift_store::ShiftTimeStore;
