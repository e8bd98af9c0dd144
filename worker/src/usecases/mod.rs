pub mod scheduled_runner;
