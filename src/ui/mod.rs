pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, muted, section, success, summary_row, warn};
pub use table::{CandidateTable, stats_table};
pub use theme::{theme, Theme};
