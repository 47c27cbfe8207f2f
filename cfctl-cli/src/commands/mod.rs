pub mod alias_cmd;
pub mod api_resources;
pub mod service_info;
