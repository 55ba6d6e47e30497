use std::fmt;
use std::time::Duration;

/// What the save indicator shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saving,
    NotSavedYet,
    SavedAgo(Duration),
}

impl SaveStatus {
    pub fn is_saving(&self) -> bool {
        matches!(self, Self::Saving)
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saving => f.write_str("Saving..."),
            Self::NotSavedYet => f.write_str("Last saved: Not saved yet"),
            Self::SavedAgo(elapsed) => write!(f, "Last saved: {}", format_elapsed(*elapsed)),
        }
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{secs} seconds ago")
    } else if secs < 3600 {
        format!("{} minutes ago", secs / 60)
    } else {
        format!("{} hours ago", secs / 3600)
    }
}
