use crate::domain::notification::{Notification, NotificationCategory, NotificationFilter};
use crate::error::{PortalError, Result};
use chrono::NaiveDate;
use tracing::debug;

/// The student's notification inbox.
///
/// Opening a notification shows it in the detail dialog and marks it read.
/// The unread count is always derived from the notifications themselves.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    notifications: Vec<Notification>,
    filter: NotificationFilter,
    selected: Option<u32>,
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        PortalError::ValidationError(format!("Invalid date: {year}-{month}-{day}"))
    })
}

impl NotificationCenter {
    pub fn new(notifications: Vec<Notification>) -> Self {
        Self {
            notifications,
            ..Self::default()
        }
    }

    /// The inbox a student sees at the end of the spring term.
    pub fn demo() -> Result<Self> {
        let item = |id, title: &str, content: &str, date, category, read| Notification {
            id,
            title: title.to_string(),
            content: content.to_string(),
            date,
            category,
            read,
        };

        Ok(Self::new(vec![
            item(
                1,
                "Summer term registration opens",
                "Registration for the summer term runs from 5 to 15 May. Check with your academic advisor before registering.",
                date(2025, 5, 1)?,
                NotificationCategory::Announcement,
                false,
            ),
            item(
                2,
                "Conference on modern engineering technologies",
                "The Faculty of Engineering hosts a conference on 25 May in the main conference hall. Everyone is welcome.",
                date(2025, 4, 15)?,
                NotificationCategory::Event,
                true,
            ),
            item(
                3,
                "Midterm results are available",
                "Midterm results are published in the student information system. Raise any objection with the course instructor within one week.",
                date(2025, 4, 28)?,
                NotificationCategory::Academic,
                false,
            ),
            item(
                4,
                "Graduating students: update your records",
                "Students expected to graduate this term must update their personal data and review their academic record before 10 May.",
                date(2025, 4, 25)?,
                NotificationCategory::Important,
                false,
            ),
            item(
                5,
                "Central library closed for maintenance",
                "The central library is closed from 10 to 13 May. The digital library stays available.",
                date(2025, 4, 20)?,
                NotificationCategory::Announcement,
                true,
            ),
        ]))
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn filter(&self) -> NotificationFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: NotificationFilter) {
        self.filter = filter;
    }

    /// Notifications admitted by the current filter, in inbox order.
    pub fn visible(&self) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| self.filter.admits(n))
            .collect()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// The notification shown in the detail dialog, if it is open.
    pub fn selected(&self) -> Option<&Notification> {
        let id = self.selected?;
        self.notifications.iter().find(|n| n.id == id)
    }

    pub fn mark_read(&mut self, id: u32) -> Result<()> {
        let notification = self.find_mut(id)?;
        notification.read = true;
        Ok(())
    }

    pub fn mark_all_read(&mut self) {
        for notification in &mut self.notifications {
            notification.read = true;
        }
        debug!("all notifications marked read");
    }

    /// Opens the detail dialog for `id`, marking the notification read.
    pub fn open(&mut self, id: u32) -> Result<&Notification> {
        let notification = self.find_mut(id)?;
        if !notification.read {
            debug!(id, "notification read on open");
            notification.read = true;
        }
        self.selected = Some(id);
        self.selected()
            .ok_or_else(|| PortalError::ValidationError(format!("Unknown notification: {id}")))
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    fn find_mut(&mut self, id: u32) -> Result<&mut Notification> {
        self.notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| PortalError::ValidationError(format!("Unknown notification: {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(center: &NotificationCenter) -> Vec<u32> {
        center.visible().iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_demo_inbox() {
        let center = NotificationCenter::demo().unwrap();
        assert_eq!(center.notifications().len(), 5);
        assert_eq!(center.unread_count(), 3);
        assert!(center.selected().is_none());
    }

    #[test]
    fn test_open_marks_read_and_selects() {
        let mut center = NotificationCenter::demo().unwrap();

        let opened = center.open(3).unwrap();
        assert_eq!(opened.title, "Midterm results are available");
        assert!(opened.read);
        assert_eq!(center.unread_count(), 2);
        assert_eq!(center.selected().unwrap().id, 3);

        // Opening an already read notification changes nothing but the selection.
        center.open(2).unwrap();
        assert_eq!(center.unread_count(), 2);

        center.close();
        assert!(center.selected().is_none());
        assert!(center.notifications()[2].read);
    }

    #[test]
    fn test_open_unknown_keeps_selection() {
        let mut center = NotificationCenter::demo().unwrap();
        center.open(1).unwrap();
        assert!(matches!(
            center.open(42),
            Err(PortalError::ValidationError(_))
        ));
        assert_eq!(center.selected().unwrap().id, 1);
        assert!(center.mark_read(42).is_err());
    }

    #[test]
    fn test_mark_all_read() {
        let mut center = NotificationCenter::demo().unwrap();
        center.mark_read(1).unwrap();
        assert_eq!(center.unread_count(), 2);

        center.mark_all_read();
        assert_eq!(center.unread_count(), 0);
        center.set_filter(NotificationFilter::Unread);
        assert!(center.visible().is_empty());
    }

    #[test]
    fn test_filters() {
        let mut center = NotificationCenter::demo().unwrap();
        assert_eq!(ids(&center), vec![1, 2, 3, 4, 5]);

        center.set_filter(NotificationFilter::Unread);
        assert_eq!(ids(&center), vec![1, 3, 4]);

        center.set_filter(NotificationFilter::Category(
            NotificationCategory::Announcement,
        ));
        assert_eq!(ids(&center), vec![1, 5]);

        center.set_filter(NotificationFilter::Category(NotificationCategory::Event));
        assert_eq!(ids(&center), vec![2]);

        center.set_filter(NotificationFilter::Unread);
        center.open(4).unwrap();
        assert_eq!(ids(&center), vec![1, 3]);
    }
}
