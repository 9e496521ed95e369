// Read-side summaries over the work sheet. Pure scanning and formatting;
// the sheet itself is behind the RowStore port in worklog_service.

pub mod dates;
pub mod query;
pub mod summary;
pub mod worklog_service;

pub use query::{Subject, WorkQuery};
pub use summary::{GroupedSummary, WorkCategory};
pub use worklog_service::{FrequencyReply, RowStore, SummaryReply, WorkRow, WorklogError, WorklogService};
