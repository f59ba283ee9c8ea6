pub mod backend;
pub mod error;
pub mod history;
pub mod leads;
pub mod memory;
pub mod rest;
pub mod rows;

pub use backend::{Row, RowPage, SelectQuery, StoreBackend};
pub use error::StoreError;
pub use history::HistoryRepo;
pub use leads::{LeadPage, LeadRepo, ListParams, SortSpec};
pub use memory::MemoryBackend;
pub use rest::{RestBackend, RestConfig};
