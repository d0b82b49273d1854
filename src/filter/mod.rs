pub mod builder;
pub mod error;
pub mod page;
pub mod types;

pub use builder::QueryBuilder;
pub use error::FilterError;
pub use page::{ListResponse, PageParams};
pub use types::{FieldFilter, SortDirection, SqlParam, SqlResult};
