pub mod api;
pub mod in_memory;
