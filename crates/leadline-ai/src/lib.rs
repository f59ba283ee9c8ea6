mod http;
mod mock;
mod suggester;

pub use http::{HttpTagSuggester, SuggesterConfig};
pub use mock::MockSuggester;
pub use suggester::{clean_tags, SuggestError, TagSuggester, MAX_TAGS};
