use crate::JobStatus;

/// Coarse colour class for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Active,
    Milestone,
    Success,
    Danger,
    Muted,
}

/// Display metadata for one status tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusStyle {
    pub label: String,
    pub tone: Tone,
    pub icon: &'static str,
}

impl JobStatus {
    /// Every variant is matched explicitly so a new tag must pick a style.
    pub fn style(&self) -> StatusStyle {
        let (label, tone, icon) = match self {
            JobStatus::Pending => ("Pending", Tone::Neutral, "…"),
            JobStatus::Initializing => ("Initializing", Tone::Active, "⚙"),
            JobStatus::Processing => ("Processing", Tone::Active, "⚙"),
            JobStatus::GeneratingScript => ("Generating script", Tone::Active, "✎"),
            JobStatus::ScriptGenerated => ("Script ready", Tone::Milestone, "✎"),
            JobStatus::GeneratingAssets => ("Generating assets", Tone::Active, "▣"),
            JobStatus::AssetsGenerated => ("Assets ready", Tone::Milestone, "▣"),
            JobStatus::Animating => ("Animating", Tone::Active, "◐"),
            JobStatus::AnimationCreated => ("Animation ready", Tone::Milestone, "◐"),
            JobStatus::Rendering => ("Rendering", Tone::Active, "▶"),
            JobStatus::Completed => ("Completed", Tone::Success, "✔"),
            JobStatus::Error => ("Error", Tone::Danger, "✖"),
            JobStatus::Failed => ("Failed", Tone::Danger, "✖"),
            JobStatus::Cancelled => ("Cancelled", Tone::Muted, "⊘"),
            JobStatus::Other(tag) => {
                return StatusStyle {
                    label: tag.replace('_', " "),
                    tone: Tone::Neutral,
                    icon: "?",
                }
            }
        };
        StatusStyle {
            label: label.to_string(),
            tone,
            icon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_have_closing_tones() {
        assert_eq!(JobStatus::Completed.style().tone, Tone::Success);
        assert_eq!(JobStatus::Error.style().tone, Tone::Danger);
        assert_eq!(JobStatus::Failed.style().tone, Tone::Danger);
        assert_eq!(JobStatus::Cancelled.style().tone, Tone::Muted);
    }

    #[test]
    fn unknown_tag_keeps_its_text() {
        let style = JobStatus::from_tag("uploading_to_cdn").style();
        assert_eq!(style.label, "uploading to cdn");
        assert_eq!(style.tone, Tone::Neutral);
    }
}
