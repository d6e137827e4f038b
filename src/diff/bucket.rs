//! Year/month buckets for date-organized copies

use chrono::{DateTime, Datelike, Local};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::SystemTime;

const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const PORTUGUESE_MONTHS: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Built-in month name lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthLocale {
    #[default]
    #[serde(alias = "en")]
    English,
    #[serde(alias = "pt")]
    Portuguese,
}

impl MonthLocale {
    /// The twelve month names, January first
    pub fn names(self) -> Vec<String> {
        let names = match self {
            MonthLocale::English => ENGLISH_MONTHS,
            MonthLocale::Portuguese => PORTUGUESE_MONTHS,
        };
        names.iter().map(|name| name.to_string()).collect()
    }
}

/// Destination bucket derived from a modification time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModificationBucket {
    pub year: i32,
    /// 1..=12
    pub month: u32,
    pub month_name: String,
}

impl ModificationBucket {
    /// Bucket for `mtime` interpreted in local time.
    ///
    /// `month_names` must hold twelve entries (checked by `Config::validate`);
    /// a short list falls back to the bare month number.
    pub fn from_mtime(mtime: SystemTime, month_names: &[String]) -> Self {
        let local: DateTime<Local> = DateTime::from(mtime);
        let month = local.month();
        let month_name = month_names
            .get(month as usize - 1)
            .cloned()
            .unwrap_or_else(|| month.to_string());

        Self {
            year: local.year(),
            month,
            month_name,
        }
    }

    /// `<month>_<name>`, e.g. `3_March`
    pub fn dir_name(&self) -> String {
        format!("{}_{}", self.month, self.month_name)
    }

    /// `<year>/<month>_<name>`, relative to the destination root
    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(self.year.to_string()).join(self.dir_name())
    }
}
