pub mod store;
pub mod memory;
pub mod supabase;

pub use store::{AppointmentStore, SharedAppointmentStore};
pub use memory::InMemoryAppointmentStore;
pub use supabase::SupabaseAppointmentStore;
