//! Taggers: handlers that only change metadata.
//!
//! Each tagger struct doubles as its own configuration and implements
//! [`Tagger`](crate::handlers::Tagger).

pub mod character_case;
pub mod constant;
pub mod copy;
pub mod count_matches;
pub mod current_date;
pub mod date_format;
pub mod debug;
pub mod delete;
pub mod field_report;
pub mod force_single_value;
pub mod hierarchy;
pub mod keep_only;
pub mod merge;
pub mod rename;
pub mod replace;
pub mod split;
pub mod text_between;
pub mod text_pattern;
pub mod text_statistics;
pub mod title_generator;
pub mod truncate;
pub mod uuid;

pub use character_case::{ApplyTo, CaseType, CharacterCaseTagger};
pub use constant::{Constant, ConstantTagger};
pub use copy::{CopyOperation, CopyTagger};
pub use count_matches::{CountMatchesTagger, MatchCount};
pub use current_date::CurrentDateTagger;
pub use date_format::DateFormatTagger;
pub use debug::{DebugTagger, LogLevel};
pub use delete::DeleteTagger;
pub use field_report::{FieldReportTagger, FieldStats};
pub use force_single_value::{ForceSingleValueTagger, SingleValueAction};
pub use hierarchy::{HierarchyOperation, HierarchyTagger};
pub use keep_only::KeepOnlyTagger;
pub use merge::{MergeOperation, MergeTagger};
pub use rename::{RenameOperation, RenameTagger};
pub use replace::{Replacement, ReplaceTagger};
pub use split::{SplitOperation, SplitTagger};
pub use text_between::{TextBetween, TextBetweenTagger};
pub use text_pattern::{TextPattern, TextPatternTagger};
pub use text_statistics::{TextStatistics, TextStatisticsTagger};
pub use title_generator::TitleGeneratorTagger;
pub use truncate::TruncateTagger;
pub use self::uuid::UuidTagger;
