pub mod call_log;

pub use call_log::{CallLog, CallLogPage, CALL_STARTED_DIGIT};
