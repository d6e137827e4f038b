//! Copy planning - set difference and date buckets

mod bucket;
mod plan;

pub use bucket::{ModificationBucket, MonthLocale};
pub use plan::{generate_bucket_plan, generate_copy_plan, CopyPlan, PlanStats, PlannedCopy};
