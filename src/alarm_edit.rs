use eframe::egui::{
    self, Color32, Id, Key, LayerId, Order, ScrollArea, TextEdit, Window,
};
use log::{info, warn};

use crate::{
    alarm::AlarmTime,
    error::Error,
    store::{AlarmStore, Insert},
};

/// Validates `input` and stores it. Shared by the admin panel and the CLI.
pub fn add_time<S: AlarmStore + ?Sized>(store: &S, input: &str) -> Result<AlarmTime, Error> {
    let time: AlarmTime = input.parse()?;
    match store.insert(time)? {
        Insert::Added => {
            info!("alarm {time} added");
            Ok(time)
        }
        Insert::Duplicate => Err(Error::Duplicate(time.to_string())),
    }
}

/// Validates `input` and removes it; removing an unknown time succeeds.
pub fn remove_time<S: AlarmStore + ?Sized>(store: &S, input: &str) -> Result<AlarmTime, Error> {
    let time: AlarmTime = input.parse()?;
    store.delete(time)?;
    info!("alarm {time} removed");
    Ok(time)
}

/// Feedback shown under the panel after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

impl Notice {
    const fn color(&self) -> Color32 {
        match self {
            Self::Success(_) => Color32::from_rgb(0x2e, 0x9d, 0x44),
            Self::Warning(_) => Color32::from_rgb(0xd9, 0x8c, 0x00),
            Self::Error(_) => Color32::from_rgb(0xd0, 0x30, 0x30),
        }
    }

    fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Warning(text) | Self::Error(text) => text,
        }
    }
}

enum Action {
    Add,
    Delete,
    Close,
}

/// Local CRUD window over the alarm store.
#[derive(Debug, Default)]
pub struct AdminPanel {
    open: bool,
    raise: bool,
    entry: String,
    times: Vec<AlarmTime>,
    selected: Option<AlarmTime>,
    notice: Option<Notice>,
}

const WINDOW_ID: &str = "admin_panel";

impl AdminPanel {
    /// Opens the panel, or brings it to the front when it already is.
    pub fn open<S: AlarmStore + ?Sized>(&mut self, store: &S) {
        if self.open {
            self.raise = true;
            return;
        }
        self.open = true;
        self.raise = true;
        self.notice = None;
        self.refresh(store);
    }

    pub fn close(&mut self) {
        self.open = false;
        self.entry.clear();
        self.selected = None;
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn times(&self) -> &[AlarmTime] {
        &self.times
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn select(&mut self, time: Option<AlarmTime>) {
        self.selected = time;
    }

    pub fn set_entry(&mut self, entry: impl Into<String>) {
        self.entry = entry.into();
    }

    pub fn refresh<S: AlarmStore + ?Sized>(&mut self, store: &S) {
        match store.list() {
            Ok(times) => {
                if self.selected.is_some_and(|selected| !times.contains(&selected)) {
                    self.selected = None;
                }
                self.times = times;
            }
            Err(err) => {
                warn!("couldn't list alarms: {err}");
                self.notice = Some(Notice::Error(err.to_string()));
            }
        }
    }

    /// Adds the time typed into the entry.
    pub fn submit<S: AlarmStore + ?Sized>(&mut self, store: &S) {
        let notice = match add_time(store, &self.entry) {
            Ok(time) => {
                self.entry.clear();
                Notice::Success(format!("Alarm {time} added"))
            }
            Err(Error::Validation(err)) => {
                Notice::Error(format!("Invalid format, use HH:MM (e.g. 08:30): {err}"))
            }
            Err(Error::Duplicate(time)) => Notice::Warning(format!("{time} is already registered")),
            Err(err) => {
                warn!("couldn't add alarm: {err}");
                Notice::Error(err.to_string())
            }
        };
        self.notice = Some(notice);
        self.refresh(store);
    }

    pub fn delete_selected<S: AlarmStore + ?Sized>(&mut self, store: &S) {
        let Some(time) = self.selected else {
            self.notice = Some(Notice::Warning("Select a time to delete".to_string()));
            return;
        };
        self.notice = Some(match store.delete(time) {
            Ok(()) => {
                info!("alarm {time} removed");
                self.selected = None;
                Notice::Success(format!("Alarm {time} removed"))
            }
            Err(err) => {
                warn!("couldn't remove alarm {time}: {err}");
                Notice::Error(err.to_string())
            }
        });
        self.refresh(store);
    }

    pub fn show<S: AlarmStore + ?Sized>(&mut self, ctx: &egui::Context, store: &S) {
        if !self.open {
            return;
        }
        let id = Id::new(WINDOW_ID);
        let focus_entry = std::mem::take(&mut self.raise);
        if focus_entry {
            ctx.move_to_top(LayerId::new(Order::Middle, id));
        }

        let mut action = None;
        Window::new("Alarm times")
            .id(id)
            .collapsible(false)
            .resizable(false)
            .default_size([400.0, 500.0])
            .show(ctx, |ui| {
                ui.heading("Manage alarm times");
                ui.add_space(8.0);
                ui.group(|ui| {
                    ui.label("Time (HH:MM):");
                    ui.horizontal(|ui| {
                        let entry = ui.add(
                            TextEdit::singleline(&mut self.entry)
                                .desired_width(80.0)
                                .hint_text("08:30"),
                        );
                        if focus_entry {
                            entry.request_focus();
                        }
                        let entered =
                            entry.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
                        if ui.button("Add").clicked() || entered {
                            action = Some(Action::Add);
                        }
                    });
                });
                ui.add_space(8.0);
                ui.label("Registered times");
                ScrollArea::vertical()
                    .id_salt("alarm_times")
                    .max_height(300.0)
                    .show(ui, |ui| {
                        if self.times.is_empty() {
                            ui.weak("no alarms yet");
                        }
                        for time in &self.times {
                            let selected = self.selected == Some(*time);
                            if ui.selectable_label(selected, time.to_string()).clicked() {
                                self.selected = Some(*time);
                            }
                        }
                    });
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Delete selected").clicked() {
                        action = Some(Action::Delete);
                    }
                    if ui.button("Close").clicked() {
                        action = Some(Action::Close);
                    }
                });
                if let Some(notice) = &self.notice {
                    ui.colored_label(notice.color(), notice.text());
                }
            });

        match action {
            Some(Action::Add) => self.submit(store),
            Some(Action::Delete) => self.delete_selected(store),
            Some(Action::Close) => self.close(),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ValidationError, store::memory::MemoryStore};

    fn time(s: &str) -> AlarmTime {
        s.parse().unwrap()
    }

    #[test]
    fn add_time_validates_before_storing() {
        let store = MemoryStore::default();
        assert!(matches!(
            add_time(&store, "25:00"),
            Err(Error::Validation(ValidationError::HourOutOfRange(25)))
        ));
        assert!(store.list().unwrap().is_empty());
        assert_eq!(add_time(&store, "8:30").unwrap(), time("08:30"));
        assert!(matches!(add_time(&store, "08:30"), Err(Error::Duplicate(t)) if t == "08:30"));
        assert_eq!(store.list().unwrap(), vec![time("08:30")]);
    }

    #[test]
    fn remove_time_is_idempotent() {
        let store = MemoryStore::with(&["08:00"]);
        remove_time(&store, "09:00").unwrap();
        remove_time(&store, "08:00").unwrap();
        remove_time(&store, "08:00").unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(remove_time(&store, "8h00").is_err());
    }

    #[test]
    fn opening_lists_times() {
        let store = MemoryStore::with(&["09:40", "08:00"]);
        let mut panel = AdminPanel::default();
        panel.open(&store);
        assert!(panel.is_open());
        assert_eq!(panel.times(), [time("08:00"), time("09:40")]);
        // a second open only raises
        panel.open(&store);
        assert!(panel.is_open());
        panel.close();
        assert!(!panel.is_open());
    }

    #[test]
    fn submit_reports_each_outcome() {
        let store = MemoryStore::default();
        let mut panel = AdminPanel::default();
        panel.open(&store);

        panel.set_entry("08:3");
        panel.submit(&store);
        assert_eq!(panel.times(), [time("08:03")]);
        assert!(matches!(panel.notice(), Some(Notice::Success(_))));
        assert!(panel.entry.is_empty());

        panel.set_entry("08:03");
        panel.submit(&store);
        assert!(matches!(panel.notice(), Some(Notice::Warning(_))));
        assert_eq!(panel.entry, "08:03");

        panel.set_entry("abc");
        panel.submit(&store);
        assert!(
            matches!(panel.notice(), Some(Notice::Error(text)) if text.starts_with("Invalid format"))
        );
        assert_eq!(panel.times(), [time("08:03")]);
    }

    #[test]
    fn store_failure_is_reported_not_fatal() {
        let store = MemoryStore::default();
        let mut panel = AdminPanel::default();
        panel.open(&store);
        store.unavailable.set(true);
        panel.set_entry("10:00");
        panel.submit(&store);
        assert!(matches!(panel.notice(), Some(Notice::Error(_))));
        store.unavailable.set(false);
        panel.refresh(&store);
        assert!(panel.times().is_empty());
    }

    #[test]
    fn delete_needs_a_selection() {
        let store = MemoryStore::with(&["08:00", "09:40"]);
        let mut panel = AdminPanel::default();
        panel.open(&store);

        panel.delete_selected(&store);
        assert!(matches!(panel.notice(), Some(Notice::Warning(_))));
        assert_eq!(panel.times().len(), 2);

        panel.select(Some(time("08:00")));
        panel.delete_selected(&store);
        assert!(matches!(panel.notice(), Some(Notice::Success(_))));
        assert_eq!(panel.times(), [time("09:40")]);
        assert_eq!(panel.selected, None);
    }

    #[test]
    fn refresh_drops_vanished_selection() {
        let store = MemoryStore::with(&["08:00"]);
        let mut panel = AdminPanel::default();
        panel.open(&store);
        panel.select(Some(time("08:00")));
        store.delete(time("08:00")).unwrap();
        panel.refresh(&store);
        assert_eq!(panel.selected, None);
    }
}
