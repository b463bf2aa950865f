pub mod collection;
pub mod manager;
pub mod models;
pub mod relation;
pub mod results;
pub mod store;

pub use collection::Collection;
pub use manager::{Database, DatabaseError};
pub use relation::Relation;
pub use results::{AdvancedResults, Pagination};
pub use store::{PgStore, RecordSource};
