//! Status reporting towards the recovery screen.

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Erasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressType {
    Indeterminate,
}

pub trait UiSink {
    fn set_background(&self, background: Background);
    fn set_progress_type(&self, progress: ProgressType);
    fn print(&self, line: &str);
}

/// Prints status lines to stdout and mirrors them into the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleUi;

impl UiSink for ConsoleUi {
    fn set_background(&self, background: Background) {
        log::debug!("ui background: {:?}", background);
    }

    fn set_progress_type(&self, progress: ProgressType) {
        log::debug!("ui progress: {:?}", progress);
    }

    fn print(&self, line: &str) {
        println!("{}", line);
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            log::info!("{}", trimmed);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Background(Background),
    Progress(ProgressType),
    Line(String),
}

/// Records everything sent to the screen.
#[derive(Debug, Default)]
pub struct MemoryUi {
    events: Mutex<Vec<UiEvent>>,
}

impl MemoryUi {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: UiEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }

    pub fn events(&self) -> Vec<UiEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Printed lines, in order.
    pub fn lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Line(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn count_line(&self, line: &str) -> usize {
        self.lines().iter().filter(|l| l.as_str() == line).count()
    }
}

impl UiSink for MemoryUi {
    fn set_background(&self, background: Background) {
        self.push(UiEvent::Background(background));
    }

    fn set_progress_type(&self, progress: ProgressType) {
        self.push(UiEvent::Progress(progress));
    }

    fn print(&self, line: &str) {
        self.push(UiEvent::Line(line.to_string()));
    }
}
