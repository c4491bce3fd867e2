//! Pipeline stages and the transitions allowed between them.
//!
//! Start -> ImageCheck -> LoadHistory -> BuildPrompt -> Generate -> SearchCheck
//! -> [Search -> [FormatCitations]] -> SaveHistory -> Respond
//!
//! Any non-terminal stage may move to Failed.

use std::fmt;

/// One step of a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Start,
    ImageCheck,
    LoadHistory,
    BuildPrompt,
    Generate,
    SearchCheck,
    Search,
    FormatCitations,
    SaveHistory,
    Respond,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Respond | Stage::Failed)
    }

    /// Whether the pipeline may move from `self` to `to`.
    pub fn can_transition_to(self, to: Stage) -> bool {
        if to == Stage::Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, to),
            (Stage::Start, Stage::ImageCheck)
                | (Stage::ImageCheck, Stage::LoadHistory)
                | (Stage::LoadHistory, Stage::BuildPrompt)
                | (Stage::BuildPrompt, Stage::Generate)
                | (Stage::Generate, Stage::SearchCheck)
                | (Stage::SearchCheck, Stage::Search)
                | (Stage::SearchCheck, Stage::SaveHistory)
                | (Stage::Search, Stage::FormatCitations)
                | (Stage::Search, Stage::SaveHistory)
                | (Stage::FormatCitations, Stage::SaveHistory)
                | (Stage::SaveHistory, Stage::Respond)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::ImageCheck => "image_check",
            Stage::LoadHistory => "load_history",
            Stage::BuildPrompt => "build_prompt",
            Stage::Generate => "generate",
            Stage::SearchCheck => "search_check",
            Stage::Search => "search",
            Stage::FormatCitations => "format_citations",
            Stage::SaveHistory => "save_history",
            Stage::Respond => "respond",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}
