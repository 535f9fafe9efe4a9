pub mod doctor;
pub mod shift_manager;
pub mod shift_store;

pub use doctor::DoctorService;
pub use shift_manager::DoctorShiftManager;
pub use shift_store::ShiftTimeStore;
