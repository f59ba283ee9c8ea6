pub mod enums;
pub mod errors;
pub mod history;
pub mod ids;
pub mod lead;
pub mod time;
pub mod validate;

pub use enums::{Bhk, City, PropertyType, Purpose, Source, Status, Timeline};
pub use errors::{ActionError, RowError};
pub use history::{Diff, FieldChange, HistoryEntry};
pub use ids::{HistoryId, LeadId};
pub use lead::{Lead, LeadDraft, LeadPatch, AUDITED_FIELDS};
pub use validate::{validate_lead, Issue, LeadInput};
