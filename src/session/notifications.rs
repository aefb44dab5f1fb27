use std::collections::VecDeque;

/// Severity of a user-facing notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTone {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub tone: StatusTone,
}

/// Rolling log of notices for the host UI, newest last.
#[derive(Clone, Debug)]
pub struct NotificationLog {
    entries: VecDeque<Notification>,
    max: usize,
}

impl NotificationLog {
    pub fn new(max: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max: max.max(1),
        }
    }

    pub fn push(&mut self, text: impl Into<String>, tone: StatusTone) {
        self.entries.push_back(Notification {
            text: text.into(),
            tone,
        });
        while self.entries.len() > self.max {
            self.entries.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest_entries_past_limit() {
        let mut log = NotificationLog::new(2);
        log.push("one", StatusTone::Info);
        log.push("two", StatusTone::Warning);
        log.push("three", StatusTone::Error);
        let texts: Vec<&str> = log.iter().map(|entry| entry.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
        assert_eq!(log.latest().unwrap().tone, StatusTone::Error);
    }

    #[test]
    fn zero_limit_still_keeps_latest() {
        let mut log = NotificationLog::new(0);
        log.push("only", StatusTone::Success);
        log.push("newest", StatusTone::Success);
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest().unwrap().text, "newest");
    }
}
