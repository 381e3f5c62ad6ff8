pub mod models_info;
pub mod plugin;
