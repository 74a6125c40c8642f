pub mod chat_controller;
pub mod system_controller;
pub mod thread_controller;
