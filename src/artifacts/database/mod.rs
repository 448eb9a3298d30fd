pub mod database_entry;
pub mod entry_mode;
pub mod pack;
