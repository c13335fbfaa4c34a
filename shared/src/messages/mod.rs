pub mod command;
pub mod server_message;
