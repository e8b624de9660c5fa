pub mod console_handler;
