pub mod pool;
pub mod store;

pub use pool::{connect, migrate};
pub use store::{
    CodeChangeRow, DailySummaryRow, HealthStatus, MonthlySummaryRow, PostgresStore, SemanticSearchRow,
    WeeklySummaryRow,
};
