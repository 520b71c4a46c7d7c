pub mod attempt_log;
pub mod forms;
pub mod submissions;
