pub mod metric_key;
pub mod normalized_name;
pub mod period;
pub mod ticker;
pub mod verb;
