pub mod message;
pub mod metric_record;
pub mod parsed_command;
