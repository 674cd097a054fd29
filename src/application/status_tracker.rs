use crate::domain::status::{ApplicationStatus, ProgressBand};
use crate::error::{PortalError, Result};
use serde::Serialize;
use tracing::debug;

/// Read-only view over the status of one long-running request.
///
/// The only mutable state is whether the detail view is open.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusTracker {
    title: String,
    status: ApplicationStatus,
    detail_open: bool,
}

impl ApplicationStatusTracker {
    pub fn new(title: impl Into<String>, status: ApplicationStatus) -> Self {
        Self {
            title: title.into(),
            status,
            detail_open: false,
        }
    }

    /// Tracker for a status payload received as JSON, e.g. from the
    /// registrar. The payload is rejected unless it is consistent.
    pub fn from_json(title: impl Into<String>, payload: &str) -> Result<Self> {
        let status: ApplicationStatus = serde_json::from_str(payload)?;
        Ok(Self::new(title, status))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> &ApplicationStatus {
        &self.status
    }

    pub fn band(&self) -> ProgressBand {
        self.status.band()
    }

    pub fn is_detail_open(&self) -> bool {
        self.detail_open
    }

    pub fn open_detail(&mut self) {
        debug!(title = %self.title, "status detail opened");
        self.detail_open = true;
    }

    pub fn close_detail(&mut self) {
        self.detail_open = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceEntry {
    title: String,
    description: String,
    availability: Availability,
    progress: Option<u8>,
}

impl ServiceEntry {
    /// `progress` must be within `0..=100`, and a completed service that
    /// reports progress must report 100.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        availability: Availability,
        progress: Option<u8>,
    ) -> Result<Self> {
        let title = title.into();
        match progress {
            Some(p) if p > 100 => {
                return Err(PortalError::ValidationError(format!(
                    "Progress of '{title}' out of range: {p}"
                )));
            }
            Some(p) if availability == Availability::Completed && p != 100 => {
                return Err(PortalError::ValidationError(format!(
                    "Completed service '{title}' reports {p}% progress"
                )));
            }
            _ => {}
        }
        Ok(Self {
            title,
            description: description.into(),
            availability,
            progress,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn progress(&self) -> Option<u8> {
        self.progress
    }

    pub fn band(&self) -> Option<ProgressBand> {
        self.progress.map(ProgressBand::for_percent)
    }
}

/// What selecting a service leads to.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceView {
    /// Milestone detail for a request that is being tracked.
    StatusDetail,
    /// The service has finished and its result can be collected.
    Ready,
    /// Nothing submitted yet; offer to start a new request.
    ApplyPrompt,
}

pub const CERTIFICATE_REQUEST: &str = "Graduation certificate request";

/// Graduation services with the tracker of the one request in progress.
pub struct ServiceCatalog {
    services: Vec<ServiceEntry>,
    tracker: ApplicationStatusTracker,
    selected: Option<String>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<ServiceEntry>, tracker: ApplicationStatusTracker) -> Self {
        Self {
            services,
            tracker,
            selected: None,
        }
    }

    /// The graduation services page as it looks for a student whose
    /// certificate is waiting on the dean.
    pub fn graduation() -> Result<Self> {
        let status = ApplicationStatus::from_labels(
            65,
            [
                "Request submitted",
                "Department head approval",
                "Dean approval",
                "Certificate printing",
                "Certificate delivery",
            ],
            Some(2),
        )?;

        let services = vec![
            ServiceEntry::new(
                CERTIFICATE_REQUEST,
                "Apply for the official graduation certificate",
                Availability::InProgress,
                Some(status.percent_complete()),
            )?,
            ServiceEntry::new(
                "Graduation ceremony booking",
                "Reserve seats for the graduation ceremony",
                Availability::Available,
                None,
            )?,
            ServiceEntry::new(
                "Job seeker registration",
                "Join the university employment programme",
                Availability::Available,
                None,
            )?,
            ServiceEntry::new(
                "Academic transcript printing",
                "Print the full academic record",
                Availability::Completed,
                Some(100),
            )?,
        ];

        Ok(Self::new(
            services,
            ApplicationStatusTracker::new(CERTIFICATE_REQUEST, status),
        ))
    }

    pub fn services(&self) -> &[ServiceEntry] {
        &self.services
    }

    pub fn tracker(&self) -> &ApplicationStatusTracker {
        &self.tracker
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, title: &str) -> Result<ServiceView> {
        let Some(entry) = self.services.iter().find(|s| s.title == title) else {
            return Err(PortalError::ValidationError(format!(
                "Unknown service: {title}"
            )));
        };

        let view = if entry.title == self.tracker.title() {
            self.tracker.open_detail();
            ServiceView::StatusDetail
        } else if entry.availability == Availability::Completed {
            ServiceView::Ready
        } else {
            ServiceView::ApplyPrompt
        };
        self.selected = Some(title.to_string());
        Ok(view)
    }

    pub fn dismiss(&mut self) {
        self.tracker.close_detail();
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::MilestoneState;

    #[test]
    fn test_graduation_catalog_is_consistent() {
        let catalog = ServiceCatalog::graduation().unwrap();
        let status = catalog.tracker().status();
        assert_eq!(status.percent_complete(), 65);
        assert_eq!(status.current().unwrap().label, "Dean approval");
        assert_eq!(catalog.tracker().band(), ProgressBand::Medium);
        assert_eq!(
            status.milestones().last().unwrap().state,
            MilestoneState::Pending
        );
    }

    #[test]
    fn test_service_progress_is_bounded() {
        let result = ServiceEntry::new("Library clearance", "", Availability::InProgress, Some(150));
        assert!(matches!(result, Err(PortalError::ValidationError(_))));

        let result = ServiceEntry::new("Library clearance", "", Availability::Completed, Some(80));
        assert!(result.is_err());

        let entry =
            ServiceEntry::new("Library clearance", "", Availability::InProgress, Some(100)).unwrap();
        assert_eq!(entry.band(), Some(ProgressBand::High));
    }

    #[test]
    fn test_tracker_from_json_rejects_inconsistent_payload() {
        let payload = r#"{"percent_complete":65,"milestones":[
            {"label":"Request submitted","state":"done"},
            {"label":"Dean approval","state":"in_progress"},
            {"label":"Certificate printing","state":"in_progress"}]}"#;
        assert!(matches!(
            ApplicationStatusTracker::from_json(CERTIFICATE_REQUEST, payload),
            Err(PortalError::JsonError(_))
        ));

        let payload = r#"{"percent_complete":250,"milestones":[]}"#;
        assert!(ApplicationStatusTracker::from_json(CERTIFICATE_REQUEST, payload).is_err());

        let payload = r#"{"percent_complete":65,"milestones":[
            {"label":"Request submitted","state":"done"},
            {"label":"Dean approval","state":"in_progress"}]}"#;
        let tracker = ApplicationStatusTracker::from_json(CERTIFICATE_REQUEST, payload).unwrap();
        assert_eq!(tracker.status().current().unwrap().label, "Dean approval");
        assert!(!tracker.is_detail_open());
    }

    #[test]
    fn test_select_routes_to_views() {
        let mut catalog = ServiceCatalog::graduation().unwrap();

        assert_eq!(
            catalog.select(CERTIFICATE_REQUEST).unwrap(),
            ServiceView::StatusDetail
        );
        assert!(catalog.tracker().is_detail_open());

        catalog.dismiss();
        assert!(!catalog.tracker().is_detail_open());
        assert!(catalog.selected().is_none());

        assert_eq!(
            catalog.select("Academic transcript printing").unwrap(),
            ServiceView::Ready
        );
        assert_eq!(
            catalog.select("Graduation ceremony booking").unwrap(),
            ServiceView::ApplyPrompt
        );
        assert!(catalog.select("Parking permit").is_err());
    }
}
