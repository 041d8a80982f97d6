#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::time::Instant;

use chrono::Local;
use coordinator::{Coordinator, Settings};
use eframe::egui::{
    self, Align2, CentralPanel, Color32, CursorIcon, Frame, Key, ViewportCommand, Window,
};
use log::{error, info};

pub mod alarm;
pub mod communication;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod player;
pub mod scene;
pub mod store;
pub mod subscriber;
pub mod surface;
pub mod timer;
pub mod widgets;

/// implementation of the alarm admin panel for egui
pub mod alarm_edit;

use alarm_edit::AdminPanel;
use config::Config;
use player::{ProcessPlayer, SoundLibrary};
use scene::{LogoArt, Scene};
use store::SqliteStore;
use subscriber::Subscriber;
use surface::Size;

/// The fullscreen kiosk: bouncing logo, scheduled alarms and remote messages.
pub struct Kiosk {
    // dropped in declaration order: the player stops before the subscriber
    coordinator: Coordinator<SqliteStore, ProcessPlayer, Scene>,
    subscriber: Option<Subscriber>,
    admin: AdminPanel,
    confirming_exit: bool,
    exiting: bool,
    logo: LogoArt,
    started: Instant,
}

impl Kiosk {
    /// Starts the subscriber (when enabled) and arms the coordinator's timers.
    #[must_use]
    pub fn new(config: &Config, store: SqliteStore, ctx: &egui::Context) -> Self {
        let waker = ctx.clone();
        let (outbox, inbox) = communication::channel(move || waker.request_repaint());
        let subscriber = if config.broker.enabled {
            match Subscriber::spawn(&config.broker, outbox) {
                Ok(subscriber) => Some(subscriber),
                Err(err) => {
                    error!("{err}, remote messages disabled");
                    None
                }
            }
        } else {
            info!("broker disabled, remote messages off");
            None
        };
        let coordinator = Coordinator::new(
            store,
            ProcessPlayer::new(&config.player),
            Scene::default(),
            SoundLibrary::new(&config.sounds.dir, &config.sounds.extension),
            Settings::from_config(config),
            inbox,
        );
        Self {
            coordinator,
            subscriber,
            admin: AdminPanel::default(),
            confirming_exit: false,
            exiting: false,
            logo: LogoArt::load(ctx, &config.display),
            started: Instant::now(),
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (admin, escape, close_requested) = ctx.input(|i| {
            (
                i.key_pressed(Key::F2),
                i.key_pressed(Key::Escape),
                i.viewport().close_requested(),
            )
        });
        if admin {
            self.admin.open(self.coordinator.store());
        }
        if escape {
            self.confirming_exit = true;
        }
        // only a confirmed exit may close the kiosk
        if close_requested && !self.exiting {
            ctx.send_viewport_cmd(ViewportCommand::CancelClose);
            self.confirming_exit = true;
        }
    }

    fn render_exit_prompt(&mut self, ctx: &egui::Context) {
        if !self.confirming_exit {
            return;
        }
        let mut answer = None;
        Window::new("Exit")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Do you really want to exit?");
                ui.horizontal(|ui| {
                    if ui.button("Yes").clicked() {
                        answer = Some(true);
                    }
                    if ui.button("No").clicked() {
                        answer = Some(false);
                    }
                });
            });
        match answer {
            Some(true) => self.exit(ctx),
            Some(false) => self.confirming_exit = false,
            None => {}
        }
    }

    /// Audio first, then the network thread, then the window.
    fn exit(&mut self, ctx: &egui::Context) {
        info!("exit confirmed");
        self.confirming_exit = false;
        self.exiting = true;
        self.coordinator.shutdown();
        if let Some(mut subscriber) = self.subscriber.take() {
            subscriber.shutdown();
        }
        ctx.send_viewport_cmd(ViewportCommand::Close);
    }
}

impl eframe::App for Kiosk {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        let screen = ctx.screen_rect();
        #[allow(clippy::cast_possible_truncation)]
        let size = Size::new(screen.width() as i32, screen.height() as i32);
        self.coordinator.resize(size);
        self.coordinator
            .advance(self.started.elapsed(), Local::now().naive_local());

        if !self.admin.is_open() && !self.confirming_exit {
            ctx.set_cursor_icon(CursorIcon::None);
        }
        CentralPanel::default()
            .frame(Frame::default().fill(Color32::BLACK))
            .show(ctx, |ui| {
                self.coordinator.surface().paint(ui, &self.logo);
            });
        self.admin.show(ctx, self.coordinator.store());
        self.render_exit_prompt(ctx);

        if let Some(deadline) = self.coordinator.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_sub(self.started.elapsed()));
        }
    }
}
