//! Scheduling and presentation state.
//!
//! The coordinator lives on the UI thread and is the only thing that mutates
//! the surface, the overlay, the logo and the player. The UI loop calls
//! [`Coordinator::advance`] with the current logical and wall-clock time;
//! everything periodic is a self re-arming timer in [`Timers`].

use std::{sync::mpsc, time::Duration};

use chrono::NaiveDateTime;
use log::{debug, error, info, warn};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    alarm::{AlarmTime, MinuteStamp},
    communication::{ConnectionState, Inbound},
    config::Config,
    player::{Player, SoundLibrary},
    store::AlarmStore,
    surface::{LogoState, OverlayView, Rgb, Size, Surface},
    timer::{TimerId, Timers},
};

/// Timing and look of everything the coordinator shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub animation_period: Duration,
    pub check_interval: Duration,
    pub alarm_message: String,
    pub alarm_overlay: Duration,
    pub alarm_font_size: f32,
    pub playback_limit: Duration,
    pub message_overlay: Duration,
    pub message_font_size: f32,
    pub message_margin: i32,
    pub logo_width: i32,
    pub logo_height: i32,
    pub logo_speed: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Settings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            animation_period: Duration::from_millis(30),
            check_interval: config.alarm.check_interval(),
            alarm_message: config.alarm.message.clone(),
            alarm_overlay: config.alarm.overlay_duration(),
            alarm_font_size: 72.0,
            playback_limit: config.alarm.playback_limit(),
            message_overlay: Duration::from_millis(5000),
            message_font_size: 48.0,
            message_margin: config.display.message_margin,
            logo_width: config.display.logo_width,
            logo_height: config.display.logo_height,
            logo_speed: config.display.logo_speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Animate,
    CheckAlarms,
    DismissOverlay,
    StopAudio,
}

/// The overlay currently on screen and the timer that will take it down.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub view: OverlayView,
    pub duration: Duration,
    dismiss: TimerId,
}

#[derive(Debug, Default)]
struct AlarmRunState {
    last_fired: Option<MinuteStamp>,
    /// Pending forced stop of the current playback.
    stop_timer: Option<TimerId>,
}

pub struct Coordinator<S, P, D> {
    store: S,
    player: P,
    surface: D,
    sounds: SoundLibrary,
    rng: StdRng,
    settings: Settings,
    logo: LogoState,
    overlay: Option<Overlay>,
    run: AlarmRunState,
    timers: Timers<Task>,
    inbox: mpsc::Receiver<Inbound>,
    connection: ConnectionState,
    size: Size,
    placed: bool,
    now: Duration,
    shut_down: bool,
}

impl<S, P, D> std::fmt::Debug for Coordinator<S, P, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("logo", &self.logo)
            .field("overlay", &self.overlay)
            .field("last_fired", &self.run.last_fired)
            .field("connection", &self.connection)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl<S: AlarmStore, P: Player, D: Surface> Coordinator<S, P, D> {
    /// Arms the first alarm check and animation tick at logical time zero.
    pub fn new(
        store: S,
        player: P,
        surface: D,
        sounds: SoundLibrary,
        settings: Settings,
        inbox: mpsc::Receiver<Inbound>,
    ) -> Self {
        let logo = LogoState::new(
            settings.logo_width,
            settings.logo_height,
            settings.logo_speed,
        );
        let mut timers = Timers::new();
        timers.schedule(Duration::ZERO, Duration::ZERO, Task::CheckAlarms);
        timers.schedule(Duration::ZERO, Duration::ZERO, Task::Animate);
        Self {
            store,
            player,
            surface,
            sounds,
            rng: StdRng::from_entropy(),
            settings,
            logo,
            overlay: None,
            run: AlarmRunState::default(),
            timers,
            inbox,
            connection: ConnectionState::default(),
            size: Size::default(),
            placed: false,
            now: Duration::ZERO,
            shut_down: false,
        }
    }

    /// Runs everything due at logical time `now`: first the messages the
    /// subscriber handed over, then the expired timers in deadline order.
    pub fn advance(&mut self, now: Duration, wall: NaiveDateTime) {
        if self.shut_down {
            return;
        }
        self.now = self.now.max(now);
        self.drain_inbox();
        while let Some((id, task)) = self.timers.pop_due(self.now) {
            self.run_task(id, task, &wall);
        }
    }

    fn drain_inbox(&mut self) {
        while let Ok(message) = self.inbox.try_recv() {
            self.deliver(message);
        }
    }

    /// Handles one message from the subscriber on the UI thread.
    pub fn deliver(&mut self, message: Inbound) {
        match message {
            Inbound::Text(text) => {
                let duration = self.settings.message_overlay;
                let font_size = self.settings.message_font_size;
                self.display_message(text, duration, Rgb::YELLOW, font_size);
            }
            Inbound::Connected => {
                info!("remote messages online");
                self.connection = ConnectionState::Online;
            }
            Inbound::Disconnected => {
                info!("remote messages offline");
                self.connection = ConnectionState::Offline;
            }
        }
    }

    fn run_task(&mut self, id: TimerId, task: Task, wall: &NaiveDateTime) {
        match task {
            Task::Animate => {
                self.animate();
                self.timers
                    .schedule(self.now, self.settings.animation_period, Task::Animate);
            }
            Task::CheckAlarms => {
                self.check_alarms(wall);
                self.timers
                    .schedule(self.now, self.settings.check_interval, Task::CheckAlarms);
            }
            Task::DismissOverlay => self.dismiss_overlay(id),
            Task::StopAudio => {
                if self.run.stop_timer == Some(id) {
                    self.run.stop_timer = None;
                    info!("alarm playback limit reached");
                    self.player.stop();
                }
            }
        }
    }

    fn animate(&mut self) {
        if !self.logo.visible || self.size.is_empty() {
            return;
        }
        self.logo.step(self.size);
        self.surface.draw_logo(&self.logo);
    }

    /// Fires the alarm when the minute of `wall` is configured and has not
    /// fired yet. Returns whether it fired.
    pub fn check_alarms(&mut self, wall: &NaiveDateTime) -> bool {
        let stamp = MinuteStamp::of(wall);
        if self.run.last_fired == Some(stamp) {
            debug!("alarm {} already fired this minute", stamp.time);
            return false;
        }
        match self.store.contains(stamp.time) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(err) => {
                warn!("{err}, no alarms this check");
                return false;
            }
        }
        self.run.last_fired = Some(stamp);
        info!("alarm {} fired", stamp.time);
        self.fire_alarm();
        true
    }

    /// Class change: overlay, then a random sound cut off after the playback limit.
    pub fn fire_alarm(&mut self) {
        let text = self.settings.alarm_message.clone();
        let duration = self.settings.alarm_overlay;
        let font_size = self.settings.alarm_font_size;
        self.display_message(text, duration, Rgb::RED, font_size);

        let sound = match self.sounds.pick(&mut self.rng) {
            Ok(Some(sound)) => sound,
            Ok(None) => {
                warn!(
                    "no alarm sounds in {}, skipping playback",
                    self.sounds.dir().display()
                );
                return;
            }
            Err(err) => {
                warn!("{err}, skipping playback");
                return;
            }
        };
        if let Some(stop) = self.run.stop_timer.take() {
            self.timers.cancel(stop);
        }
        self.player.stop();
        match self.player.play(&sound) {
            Ok(()) => {
                let stop = self
                    .timers
                    .schedule(self.now, self.settings.playback_limit, Task::StopAudio);
                self.run.stop_timer = Some(stop);
            }
            Err(err) => error!("{err}"),
        }
    }

    /// Replaces whatever overlay is showing, hides the logo and arms the dismissal.
    pub fn display_message(
        &mut self,
        text: impl Into<String>,
        duration: Duration,
        color: Rgb,
        font_size: f32,
    ) {
        if let Some(previous) = self.overlay.take() {
            self.timers.cancel(previous.dismiss);
            self.surface.clear_overlay();
        }
        self.logo.visible = false;
        self.surface.hide_logo();

        #[allow(clippy::cast_precision_loss)]
        let wrap_width = (self.size.width - self.settings.message_margin).max(1) as f32;
        let view = OverlayView {
            text: text.into(),
            color,
            font_size,
            wrap_width,
        };
        debug!("showing {:?} for {duration:?}", view.text);
        self.surface.draw_overlay(&view);
        let dismiss = self
            .timers
            .schedule(self.now, duration, Task::DismissOverlay);
        self.overlay = Some(Overlay {
            view,
            duration,
            dismiss,
        });
    }

    fn dismiss_overlay(&mut self, id: TimerId) {
        if self.overlay.as_ref().map(|overlay| overlay.dismiss) != Some(id) {
            return;
        }
        self.overlay = None;
        self.surface.clear_overlay();
        self.logo.visible = true;
        self.surface.draw_logo(&self.logo);
    }

    /// Tells the coordinator how big the surface is. The first real size
    /// centres the logo, later ones keep it inside the new bounds.
    pub fn resize(&mut self, size: Size) {
        if size.is_empty() || size == self.size {
            return;
        }
        self.size = size;
        if self.placed {
            self.logo.clamp_into(size);
        } else {
            self.logo.center_in(size);
            self.placed = true;
        }
        if self.logo.visible {
            self.surface.draw_logo(&self.logo);
        }
    }

    /// Stops playback and every timer. Further calls and ticks do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.run.stop_timer = None;
        self.timers.clear();
        self.player.stop();
        info!("coordinator stopped");
    }

    /// The earliest logical time anything is due, for scheduling the next repaint.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    #[must_use]
    pub const fn logo(&self) -> &LogoState {
        &self.logo
    }

    #[must_use]
    pub const fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    /// The minute the last alarm fired in.
    #[must_use]
    pub fn last_fired(&self) -> Option<AlarmTime> {
        self.run.last_fired.map(|stamp| stamp.time)
    }

    #[must_use]
    pub const fn connection(&self) -> ConnectionState {
        self.connection
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn surface(&self) -> &D {
        &self.surface
    }
}
