//! Display primitives shared by CLI commands.

pub mod progress;
pub mod table;

pub use progress::create_progress_bar;
pub use table::{comparison_table, list_table, percent, ArmReport};
