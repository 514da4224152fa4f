use serde::{Deserialize, Serialize};

/// How a submission is presented
///
/// Guided: staged, timed visualization of the pipeline steps.
/// Fast: the result is shown as soon as it is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubmissionMode {
    Guided,
    #[default]
    Fast,
}

impl SubmissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionMode::Guided => "guided",
            SubmissionMode::Fast => "fast",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "guided" => SubmissionMode::Guided,
            _ => SubmissionMode::Fast,
        }
    }

    /// Mode implied by the profile's process-flow preference
    pub fn from_preference(show_process_flow: bool) -> Self {
        if show_process_flow {
            SubmissionMode::Guided
        } else {
            SubmissionMode::Fast
        }
    }
}

/// Stages of one scan submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowStage {
    Idle,
    Acquired,
    Preprocessing,
    Analyzing,
    /// Result and heatmap are on screen
    Visualizing,
    Persisting,
    Complete,
    Failed,
}

impl WorkflowStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStage::Complete | WorkflowStage::Failed)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WorkflowStage::Idle => "Waiting for image",
            WorkflowStage::Acquired => "Image Acquisition",
            WorkflowStage::Preprocessing => "Preprocessing",
            WorkflowStage::Analyzing => "AI Analysis",
            WorkflowStage::Visualizing => "Grad-CAM Heatmap",
            WorkflowStage::Persisting => "Saving to History",
            WorkflowStage::Complete => "Report Ready",
            WorkflowStage::Failed => "Failed",
        }
    }

    /// Whether `self -> next` is a legal edge for a submission in `mode`
    pub fn can_transition_to(&self, next: WorkflowStage, mode: SubmissionMode) -> bool {
        use WorkflowStage::*;

        if next == Failed {
            return !self.is_terminal();
        }

        match (self, next) {
            (Idle, Acquired) => true,
            (Acquired, Preprocessing) => mode == SubmissionMode::Guided,
            (Preprocessing, Analyzing) => mode == SubmissionMode::Guided,
            (Analyzing, Visualizing) => mode == SubmissionMode::Guided,
            (Acquired, Visualizing) => mode == SubmissionMode::Fast,
            (Visualizing, Persisting) => true,
            // No identity: nothing to persist
            (Visualizing, Complete) => true,
            (Persisting, Complete) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkflowStage::*;

    #[test]
    fn test_guided_path_is_linear() {
        let path = [Idle, Acquired, Preprocessing, Analyzing, Visualizing, Persisting, Complete];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1], SubmissionMode::Guided),
                "{:?} -> {:?}",
                pair[0],
                pair[1]
            );
        }
        assert!(!Acquired.can_transition_to(Analyzing, SubmissionMode::Guided));
        assert!(!Acquired.can_transition_to(Visualizing, SubmissionMode::Guided));
    }

    #[test]
    fn test_fast_path_skips_choreography() {
        assert!(Acquired.can_transition_to(Visualizing, SubmissionMode::Fast));
        assert!(!Acquired.can_transition_to(Preprocessing, SubmissionMode::Fast));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        for stage in [Acquired, Preprocessing, Analyzing, Visualizing, Persisting] {
            assert!(stage.can_transition_to(Failed, SubmissionMode::Guided));
        }
        assert!(!Complete.can_transition_to(Failed, SubmissionMode::Fast));
        assert!(!Failed.can_transition_to(Failed, SubmissionMode::Fast));
    }

    #[test]
    fn test_unauthenticated_skip() {
        assert!(Visualizing.can_transition_to(Complete, SubmissionMode::Fast));
        assert!(!Persisting.can_transition_to(Visualizing, SubmissionMode::Fast));
    }

    #[test]
    fn test_mode_from_preference() {
        assert_eq!(SubmissionMode::from_preference(true), SubmissionMode::Guided);
        assert_eq!(SubmissionMode::from_preference(false), SubmissionMode::Fast);
        assert_eq!(SubmissionMode::parse("GUIDED"), SubmissionMode::Guided);
    }
}
