pub mod command;
pub mod command_reader;
pub mod outcome_writer;
