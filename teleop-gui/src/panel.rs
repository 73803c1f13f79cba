use std::{sync::Arc, time::Duration};

use eframe::egui::{self, Key};
use teleop_core::{Direction, InputEvent, PublisherConfig, TeleopHandle, VelocityPublisher};
use teleop_rosbridge::{ConnectionState, RosbridgeClient, RosbridgeCmdVelMoveBase};
use tokio::{runtime, task::JoinHandle, time};
use tracing::{debug, error, info, warn};

use crate::{
    joystick::Joystick,
    settings::{ConnectionSettings, LimitField, PanelConfig, SettingsForm},
    style, Error,
};

const REPAINT_INTERVAL: Duration = Duration::from_millis(50);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);
const JOYSTICK_SIZE: f32 = 220.0;

/// Launches the teleoperation panel.
///
/// Network I/O runs on `runtime`; this call blocks until the window is closed.
pub fn teleop_panel(config: PanelConfig, runtime: runtime::Handle) -> Result<(), Error> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Teleop Panel")
            .with_inner_size(config.window_size),
        ..Default::default()
    };
    let panel = TeleopPanel::new(config, runtime);
    eframe::run_native(
        "Teleop Panel",
        native_options,
        Box::new(|_cc| Ok(Box::new(panel))),
    )
    .map_err(|e| Error::Other(e.to_string()))
}

/// A live rosbridge session with its publishing loop.
#[derive(Debug)]
struct Session {
    client: RosbridgeClient,
    publisher: Arc<VelocityPublisher<RosbridgeCmdVelMoveBase>>,
    task: JoinHandle<()>,
}

impl Session {
    async fn open(
        settings: ConnectionSettings,
        handle: TeleopHandle,
        config: PublisherConfig,
    ) -> Result<Self, Error> {
        let client = RosbridgeClient::connect(&settings.url, settings.connect_timeout).await?;
        let move_base = RosbridgeCmdVelMoveBase::new(&client, &settings.cmd_vel_topic)?;
        let publisher = Arc::new(VelocityPublisher::new(move_base, handle, config));
        let task = publisher.spawn();
        Ok(Self {
            client,
            publisher,
            task,
        })
    }

    /// Stops publishing (sending a final zero) before closing the socket.
    async fn shutdown(self) {
        self.publisher.stop();
        if let Err(e) = self.task.await {
            error!("velocity publisher task failed: {e}");
        }
        self.client.close();
    }
}

#[derive(Debug)]
enum Connection {
    Disconnected,
    Connecting(flume::Receiver<Result<Session, Error>>),
    Connected(Session),
    Failed(String),
}

impl Connection {
    fn status(&self) -> ConnectionState {
        match self {
            Connection::Disconnected => ConnectionState::Closed,
            Connection::Connecting(_) => ConnectionState::Connecting,
            Connection::Connected(session) => session.client.state(),
            Connection::Failed(reason) => ConnectionState::Failed(reason.clone()),
        }
    }
}

#[derive(Debug)]
struct TeleopPanel {
    runtime: runtime::Handle,
    handle: TeleopHandle,
    publisher_config: PublisherConfig,
    form: SettingsForm,
    connection: Connection,
    joystick: Joystick,
    // directions held last frame, in `Direction::ALL` order
    held: [bool; 4],
    error: Option<String>,
}

impl TeleopPanel {
    fn new(config: PanelConfig, runtime: runtime::Handle) -> Self {
        Self {
            runtime,
            handle: TeleopHandle::new(config.limits),
            publisher_config: config.publisher,
            form: SettingsForm::new(&config.connection, config.limits),
            connection: Connection::Disconnected,
            joystick: Joystick::new(JOYSTICK_SIZE),
            held: [false; 4],
            error: None,
        }
    }

    fn is_connected(&self) -> bool {
        matches!(self.connection, Connection::Connected(_))
    }

    fn connect(&mut self, ctx: &egui::Context) {
        let settings = match self.form.connection_settings() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{e}");
                self.error = Some(e.to_string());
                return;
            }
        };
        self.error = None;
        info!(url = %settings.url, topic = %settings.cmd_vel_topic, "connect");

        let (sender, receiver) = flume::bounded(1);
        let handle = self.handle.clone();
        let config = self.publisher_config;
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = Session::open(settings, handle, config).await;
            if let Err(session) = sender.send(result) {
                // The panel went away while connecting.
                if let Ok(session) = session.into_inner() {
                    session.shutdown().await;
                }
            }
            ctx.request_repaint();
        });
        self.connection = Connection::Connecting(receiver);
    }

    fn disconnect(&mut self) {
        if let Connection::Connected(session) =
            std::mem::replace(&mut self.connection, Connection::Disconnected)
        {
            info!("disconnect");
            self.runtime.spawn(session.shutdown());
        }
        self.reset_input();
    }

    fn reset_input(&mut self) {
        self.handle.apply(InputEvent::Stop);
        if let Some(event) = self.joystick.release() {
            self.handle.apply(event);
        }
        self.held = [false; 4];
    }

    /// Advances the connection state machine.
    fn poll_connection(&mut self) {
        match &self.connection {
            Connection::Connecting(receiver) => match receiver.try_recv() {
                Ok(Ok(session)) => {
                    info!("connected");
                    self.connection = Connection::Connected(session);
                }
                Ok(Err(e)) => {
                    error!("failed to connect: {e}");
                    self.connection = Connection::Failed(e.to_string());
                }
                Err(flume::TryRecvError::Empty) => {}
                Err(flume::TryRecvError::Disconnected) => {
                    self.connection = Connection::Failed("connection task aborted".into());
                }
            },
            Connection::Connected(session) => {
                let state = session.client.state();
                if !state.is_connected() {
                    warn!(%state, "rosbridge session ended");
                    if let Connection::Connected(session) =
                        std::mem::replace(&mut self.connection, Connection::Disconnected)
                    {
                        self.runtime.spawn(session.shutdown());
                    }
                    if let ConnectionState::Failed(reason) = state {
                        self.connection = Connection::Failed(reason);
                    }
                    self.reset_input();
                }
            }
            Connection::Disconnected | Connection::Failed(_) => {}
        }
    }

    fn toggle_emergency_stop(&mut self) {
        if self.handle.is_emergency_stopped() {
            self.handle.release_emergency_stop();
            return;
        }
        match &self.connection {
            Connection::Connected(session) => {
                if let Err(e) = session.publisher.emergency_stop_now() {
                    error!("{e}");
                    self.error = Some(e.to_string());
                }
            }
            _ => self.handle.engage_emergency_stop(),
        }
    }

    fn apply_limits(&mut self, limits: Option<teleop_core::VelocityLimits>) {
        if let Some(limits) = limits {
            debug!(?limits, "apply limits");
            if let Err(e) = self.handle.set_limits(limits) {
                self.error = Some(e.to_string());
            }
        }
    }

    fn settings_ui(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let editable = matches!(
            self.connection,
            Connection::Disconnected | Connection::Failed(_)
        );
        egui::Grid::new("connection_settings")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label("rosbridge URL");
                ui.add_enabled(
                    editable,
                    egui::TextEdit::singleline(&mut self.form.url).desired_width(220.0),
                );
                ui.end_row();

                ui.label("cmd_vel topic");
                ui.add_enabled(
                    editable,
                    egui::TextEdit::singleline(&mut self.form.cmd_vel_topic).desired_width(220.0),
                );
                ui.end_row();
            });

        for field in [LimitField::Linear, LimitField::Angular] {
            let has_error = self.form.has_error(field);
            let number = self.form.field(field);
            let mut value = number.value;
            let range = number.range.clone();
            let mut text_changed = false;
            ui.horizontal(|ui| {
                ui.label(number.name);
                let mut text = egui::TextEdit::singleline(&mut number.input).desired_width(60.0);
                if has_error {
                    text = text.text_color(style::ERROR);
                }
                text_changed = ui.add(text).changed();
            });
            let slider_changed = ui
                .add(egui::Slider::new(&mut value, range).step_by(0.01))
                .changed();

            let limits = if text_changed {
                self.form.commit(field)
            } else if slider_changed {
                self.form.set_value(field, value)
            } else {
                None
            };
            self.apply_limits(limits);
        }

        ui.horizontal(|ui| {
            let status = self.connection.status();
            if self.is_connected() {
                if ui.button("Disconnect").clicked() {
                    self.disconnect();
                }
            } else if editable {
                if ui.button("Connect").clicked() {
                    self.connect(ctx);
                }
            } else {
                ui.add_enabled(false, egui::Button::new("Connecting..."));
            }
            let color = match status {
                ConnectionState::Connected => style::OK,
                ConnectionState::Failed(_) => style::ERROR,
                _ => ui.visuals().weak_text_color(),
            };
            ui.colored_label(color, status.to_string());
        });
    }

    /// Draws the direction pad and returns which directions are held,
    /// merged with the arrow keys.
    fn direction_pad_ui(&mut self, ui: &mut egui::Ui, keyboard: [bool; 4]) -> [bool; 4] {
        let held = self.held;
        let mut pressed = [false; 4];
        let mut stop_clicked = false;

        ui.vertical_centered(|ui| {
            pressed[0] = ui
                .add(style::round_button("▲", held[0]))
                .is_pointer_button_down_on();

            ui.horizontal(|ui| {
                let row_width =
                    style::DIRECTION_BUTTON_SIZE * 3.0 + ui.spacing().item_spacing.x * 2.0;
                ui.add_space(((ui.available_width() - row_width) / 2.0).max(0.0));
                pressed[2] = ui
                    .add(style::round_button("◀", held[2]))
                    .is_pointer_button_down_on();
                stop_clicked = ui.add(style::round_button("■", false)).clicked();
                pressed[3] = ui
                    .add(style::round_button("▶", held[3]))
                    .is_pointer_button_down_on();
            });

            pressed[1] = ui
                .add(style::round_button("▼", held[1]))
                .is_pointer_button_down_on();
        });

        if stop_clicked {
            self.handle.apply(InputEvent::Stop);
        }
        std::array::from_fn(|i| pressed[i] || keyboard[i])
    }

    /// Emits pressed/released events for direction state changes.
    fn update_directions(&mut self, held: [bool; 4]) {
        for event in direction_events(self.held, held) {
            self.handle.apply(event);
        }
        self.held = held;
    }

    fn readout_ui(&self, ui: &mut egui::Ui) {
        let command = self.handle.command();
        egui::Grid::new("readout").num_columns(2).show(ui, |ui| {
            ui.label("linear.x");
            ui.monospace(format!("{:+.2} m/s", command.x));
            ui.end_row();
            ui.label("angular.z");
            ui.monospace(format!("{:+.2} rad/s", command.theta));
            ui.end_row();
        });
    }
}

/// Direction events needed to go from `before` to `after`.
///
/// Both arrays are in `Direction::ALL` order. Releases come first so that a
/// button handed over to its opposite ends up pressed.
fn direction_events(before: [bool; 4], after: [bool; 4]) -> Vec<InputEvent> {
    let mut events = vec![];
    for (i, direction) in Direction::ALL.into_iter().enumerate() {
        if before[i] && !after[i] {
            events.push(InputEvent::DirectionReleased(direction));
        }
    }
    for (i, direction) in Direction::ALL.into_iter().enumerate() {
        if !before[i] && after[i] {
            events.push(InputEvent::DirectionPressed(direction));
        }
    }
    events
}

impl eframe::App for TeleopPanel {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_connection();

        // Keyboard shortcuts, unless a text field is being edited.
        let mut keyboard = [false; 4];
        let mut toggle_estop = false;
        if !ctx.wants_keyboard_input() {
            ctx.input(|i| {
                keyboard = [
                    i.key_down(Key::ArrowUp),
                    i.key_down(Key::ArrowDown),
                    i.key_down(Key::ArrowLeft),
                    i.key_down(Key::ArrowRight),
                ];
                toggle_estop = i.key_pressed(Key::Space);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Teleop Panel");
            ui.separator();
            self.settings_ui(ui, ctx);
            ui.separator();

            let estopped = self.handle.is_emergency_stopped();
            ui.vertical_centered(|ui| {
                if ui.add(style::emergency_stop_button(estopped)).clicked() {
                    toggle_estop = true;
                }
            });
            ui.add_space(8.0);

            let enabled = self.is_connected() && !estopped;
            ui.vertical_centered(|ui| {
                if let Some(event) = self.joystick.show(ui, enabled) {
                    self.handle.apply(event);
                }
            });
            ui.add_space(8.0);

            let held = self.direction_pad_ui(ui, keyboard);
            if enabled && !self.joystick.is_active() {
                self.update_directions(held);
            } else {
                self.update_directions([false; 4]);
            }

            ui.separator();
            self.readout_ui(ui);
            if let Some(error) = &self.error {
                ui.colored_label(style::ERROR, format!("Error: {error}"));
            }
            if let Some((_, msg)) = &self.form.field_error {
                ui.colored_label(style::ERROR, format!("Error: {msg}"));
            }
        });

        if toggle_estop {
            self.toggle_emergency_stop();
        }

        if !matches!(
            self.connection,
            Connection::Disconnected | Connection::Failed(_)
        ) {
            ctx.request_repaint_after(REPAINT_INTERVAL);
        }
    }
}

impl Drop for TeleopPanel {
    fn drop(&mut self) {
        if let Connection::Connected(session) =
            std::mem::replace(&mut self.connection, Connection::Disconnected)
        {
            debug!("shutting down session");
            let _ = self
                .runtime
                .block_on(time::timeout(SHUTDOWN_TIMEOUT, session.shutdown()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_events() {
        assert!(direction_events([false; 4], [false; 4]).is_empty());
        assert_eq!(
            direction_events([false; 4], [true, false, true, false]),
            vec![
                InputEvent::DirectionPressed(Direction::Forward),
                InputEvent::DirectionPressed(Direction::Left),
            ]
        );
        // forward handed over to backward
        assert_eq!(
            direction_events([true, false, false, false], [false, true, false, false]),
            vec![
                InputEvent::DirectionReleased(Direction::Forward),
                InputEvent::DirectionPressed(Direction::Backward),
            ]
        );
    }

    #[test]
    fn test_direction_events_drive_handle() {
        let handle = TeleopHandle::default();
        for event in direction_events([false; 4], [true, false, false, true]) {
            handle.apply(event);
        }
        let input = handle.input();
        assert_eq!(input.linear, 1.0);
        assert_eq!(input.angular, -1.0);

        for event in direction_events([true, false, false, true], [false; 4]) {
            handle.apply(event);
        }
        assert!(handle.input().is_zero());
    }
}
