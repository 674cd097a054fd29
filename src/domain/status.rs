use crate::error::PortalError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneState {
    Done,
    InProgress,
    Pending,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Milestone {
    pub label: String,
    pub state: MilestoneState,
}

impl Milestone {
    pub fn new(label: impl Into<String>, state: MilestoneState) -> Self {
        Self {
            label: label.into(),
            state,
        }
    }
}

/// Colour band used when rendering a progress bar.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ProgressBand {
    Low,
    Medium,
    High,
}

impl ProgressBand {
    pub fn for_percent(percent: u8) -> Self {
        if percent < 30 {
            ProgressBand::Low
        } else if percent < 70 {
            ProgressBand::Medium
        } else {
            ProgressBand::High
        }
    }
}

/// Progress of a long-running external process.
///
/// Milestones are always `Done*`, at most one `InProgress`, then `Pending*`.
/// `percent_complete` is 100 exactly when every milestone is done.
/// Deserialized payloads go through the same checks as [`ApplicationStatus::new`].
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(try_from = "StatusPayload")]
pub struct ApplicationStatus {
    percent_complete: u8,
    milestones: Vec<Milestone>,
}

/// Unchecked wire shape of an [`ApplicationStatus`].
#[derive(Deserialize)]
struct StatusPayload {
    percent_complete: u8,
    milestones: Vec<Milestone>,
}

impl TryFrom<StatusPayload> for ApplicationStatus {
    type Error = PortalError;

    fn try_from(payload: StatusPayload) -> Result<Self, Self::Error> {
        Self::new(payload.percent_complete, payload.milestones)
    }
}

impl ApplicationStatus {
    pub fn new(percent_complete: u8, milestones: Vec<Milestone>) -> Result<Self, PortalError> {
        if percent_complete > 100 {
            return Err(PortalError::ValidationError(format!(
                "Percent complete out of range: {percent_complete}"
            )));
        }

        let mut seen = MilestoneState::Done;
        for milestone in &milestones {
            let ok = match (seen, milestone.state) {
                (MilestoneState::Done, _) => true,
                (MilestoneState::InProgress, MilestoneState::Pending) => true,
                (MilestoneState::Pending, MilestoneState::Pending) => true,
                _ => false,
            };
            if !ok {
                return Err(PortalError::ValidationError(format!(
                    "Milestone '{}' is out of order",
                    milestone.label
                )));
            }
            seen = milestone.state;
        }

        let all_done = !milestones.is_empty()
            && milestones.iter().all(|m| m.state == MilestoneState::Done);
        if all_done != (percent_complete == 100) {
            return Err(PortalError::ValidationError(format!(
                "Percent complete {percent_complete} disagrees with milestone states"
            )));
        }

        Ok(Self {
            percent_complete,
            milestones,
        })
    }

    /// Builds the milestone list from labels, marking everything before
    /// `current` as done and `current` itself as in progress. `None` means
    /// every milestone is done.
    pub fn from_labels<S: Into<String>>(
        percent_complete: u8,
        labels: impl IntoIterator<Item = S>,
        current: Option<usize>,
    ) -> Result<Self, PortalError> {
        let milestones = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                let state = match current {
                    None => MilestoneState::Done,
                    Some(c) if i < c => MilestoneState::Done,
                    Some(c) if i == c => MilestoneState::InProgress,
                    Some(_) => MilestoneState::Pending,
                };
                Milestone::new(label, state)
            })
            .collect();
        Self::new(percent_complete, milestones)
    }

    pub fn percent_complete(&self) -> u8 {
        self.percent_complete
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn current(&self) -> Option<&Milestone> {
        self.milestones
            .iter()
            .find(|m| m.state == MilestoneState::InProgress)
    }

    pub fn is_complete(&self) -> bool {
        self.percent_complete == 100
    }

    pub fn band(&self) -> ProgressBand {
        ProgressBand::for_percent(self.percent_complete)
    }
}
