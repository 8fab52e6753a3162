use crate::gb::cartridge::Cartridge;
use crate::gb::joypad::JoypadInput;
use crate::gb::ppu::buffer::FrameBuffer;
use crate::gb::ppu::misc::Shade;
use crate::gb::{Emulator, EmulatorConfig, EmulatorMessage, FrontendMessage, GBResult};
use eframe::egui;
use eframe::epaint::ColorImage;
use eframe::epaint::textures::TextureOptions;
use egui::{Color32, Key, RichText, TextureHandle, Ui, Vec2};
use log::{debug, error, info};
use std::sync::mpsc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::thread::JoinHandle;

/// A channel to communicate between the emulator and the frontend.
/// The frontend can send messages with `sender`
/// and receive messages from the emulator with `receiver`.
struct EmulatorChannel {
    pub sender: Sender<FrontendMessage>,
    pub receiver: Receiver<EmulatorMessage>,
}

impl EmulatorChannel {
    #[inline]
    pub const fn new(sender: Sender<FrontendMessage>, receiver: Receiver<EmulatorMessage>) -> Self {
        Self { sender, receiver }
    }
}

/// The emulator frontend is responsible for handling the emulator instance,
/// it runs in a separate thread and communicates with the emulator using a channel.
pub struct EmulatorFrontend {
    thread: Option<JoinHandle<GBResult<()>>>,
    channel: EmulatorChannel,
    frame: Option<TextureHandle>,
    abort: Option<String>,
    input: JoypadInput,
    upscale: usize,
}

impl EmulatorFrontend {
    /// Starts the emulator with the given cartridge.
    pub fn start(cartridge: Cartridge, config: EmulatorConfig) -> Self {
        let (emulator_sender, emulator_receiver) = mpsc::channel();
        let (frontend_sender, frontend_receiver) = mpsc::channel();
        let upscale = config.upscale.max(1);

        let thread = thread::spawn(move || {
            Emulator::new(emulator_sender, frontend_receiver, cartridge, &config).run()
        });
        Self {
            thread: Some(thread),
            channel: EmulatorChannel::new(frontend_sender, emulator_receiver),
            frame: None,
            abort: None,
            input: JoypadInput::default(),
            upscale,
        }
    }

    pub fn update(&mut self, ctx: &egui::Context, ui: &mut Ui) {
        self.handle_user_input(ui);
        self.recv_messages(ctx);
        self.draw_emulator_frame(ui);
        if let Some(abort) = &self.abort {
            ui.label(RichText::new(format!("Emulation aborted: {abort}")).color(Color32::RED));
        }
        ctx.request_repaint();
    }

    /// Shuts the emulator down by sending a stop message and waiting for it to finish.
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        info!(target: "frontend", "Stopping emulator ...");
        self.send_message(FrontendMessage::Stop);
        match thread.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(target: "frontend", "Emulator stopped with an error: {err}"),
            Err(_) => error!(target: "frontend", "Emulator thread panicked"),
        }
    }

    /// Draws the latest frame from the emulator to the screen
    #[inline]
    fn draw_emulator_frame(&self, ui: &mut Ui) {
        if let Some(frame) = &self.frame {
            let [width, height] = frame.size();
            ui.image((frame.id(), Vec2::new(width as f32, height as f32)));
        }
    }

    /// Sets the frame texture to the given `FrameBuffer`.
    fn set_frame_texture(&mut self, frame: &FrameBuffer, ctx: &egui::Context) {
        let image = frame_image(frame, self.upscale);
        let options = TextureOptions::NEAREST;

        // Set the new frame to the texture or create a new one if it doesn't exist
        if let Some(frame) = &mut self.frame {
            frame.set(image, options);
        } else {
            self.frame = Some(ctx.load_texture("frame", image, options));
        }
    }

    /// Drains all pending messages, only the latest frame gets painted.
    /// An abort keeps the last frame on screen together with the reason.
    fn recv_messages(&mut self, ctx: &egui::Context) {
        let mut latest = None;
        while let Ok(msg) = self.channel.receiver.try_recv() {
            match msg {
                EmulatorMessage::Frame(frame) => latest = Some(frame),
                EmulatorMessage::Aborted(reason) => self.abort = Some(reason),
            }
        }
        if let Some(frame) = latest {
            self.set_frame_texture(&frame, ctx);
        }
    }

    /// Sends a message to the emulator.
    #[inline]
    fn send_message(&self, message: FrontendMessage) {
        if self.channel.sender.send(message).is_err() {
            debug!(target: "frontend", "Emulator isn't running");
        }
    }

    /// Sends the button state to the emulator whenever it changes.
    fn handle_user_input(&mut self, ui: &mut Ui) {
        let input = ui.input(|i| joypad_input(i.keys_down.iter()));
        if input != self.input {
            self.input = input;
            self.send_message(FrontendMessage::Input(input));
        }
    }
}

/// Translates the pressed keys into the button state.
/// Arrows map to the D-pad, X to A, Z to B, Enter to Start and Backspace to Select.
pub fn joypad_input<'a>(keys: impl Iterator<Item = &'a Key>) -> JoypadInput {
    let mut input = JoypadInput::default();
    for key in keys {
        match key {
            Key::ArrowLeft => input.left = true,
            Key::ArrowRight => input.right = true,
            Key::ArrowUp => input.up = true,
            Key::ArrowDown => input.down = true,
            Key::X => input.a = true,
            Key::Z => input.b = true,
            Key::Enter => input.start = true,
            Key::Backspace => input.select = true,
            _ => {}
        }
    }
    input
}

/// Maps a shade to the colour shown on screen.
#[inline]
pub const fn shade_color(shade: Shade) -> Color32 {
    match shade {
        Shade::White => Color32::WHITE,
        Shade::LightGrey => Color32::from_gray(0xAB),
        Shade::DarkGrey => Color32::from_gray(0x55),
        Shade::Black => Color32::BLACK,
    }
}

/// Converts a frame into an image, every pixel becomes an `upscale` x `upscale` square.
pub fn frame_image(frame: &FrameBuffer, upscale: usize) -> ColorImage {
    let width = frame.width() * upscale;
    let mut pixels = Vec::with_capacity(width * frame.height() * upscale);
    for row in frame.rows() {
        let line = row
            .iter()
            .flat_map(|&shade| std::iter::repeat_n(shade_color(shade), upscale))
            .collect::<Vec<_>>();
        for _ in 0..upscale {
            pixels.extend_from_slice(&line);
        }
    }
    ColorImage {
        size: [width, frame.height() * upscale],
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_image_no_upscale() {
        let mut frame = FrameBuffer::default();
        frame.write_pixel(1, 0, Shade::Black);
        let image = frame_image(&frame, 1);
        assert_eq!(image.size, [160, 144]);
        assert_eq!(image.pixels[0], Color32::WHITE);
        assert_eq!(image.pixels[1], Color32::BLACK);
    }

    #[test]
    fn test_frame_image_upscale() {
        let mut frame = FrameBuffer::default();
        frame.write_pixel(1, 1, Shade::DarkGrey);
        let image = frame_image(&frame, 3);
        assert_eq!(image.size, [480, 432]);
        assert_eq!(image.pixels.len(), 480 * 432);
        for y in 3..6 {
            for x in 3..6 {
                assert_eq!(image.pixels[y * 480 + x], Color32::from_gray(0x55));
            }
        }
        assert_eq!(image.pixels[2 * 480 + 3], Color32::WHITE);
        assert_eq!(image.pixels[3 * 480 + 6], Color32::WHITE);
    }

    #[test]
    fn test_shade_colors() {
        assert_eq!(shade_color(Shade::White), Color32::WHITE);
        assert_eq!(shade_color(Shade::LightGrey), Color32::from_rgb(0xAB, 0xAB, 0xAB));
        assert_eq!(shade_color(Shade::DarkGrey), Color32::from_rgb(0x55, 0x55, 0x55));
        assert_eq!(shade_color(Shade::Black), Color32::BLACK);
    }

    #[test]
    fn test_key_mapping() {
        let keys = [Key::ArrowUp, Key::X, Key::Enter, Key::Q];
        let input = joypad_input(keys.iter());
        assert_eq!(
            input,
            JoypadInput {
                up: true,
                a: true,
                start: true,
                ..Default::default()
            }
        );

        let keys = [Key::ArrowLeft, Key::ArrowRight, Key::ArrowDown, Key::Z, Key::Backspace];
        let input = joypad_input(keys.iter());
        assert!(input.left && input.right && input.down && input.b && input.select);
        assert!(!input.a && !input.start && !input.up);

        assert_eq!(joypad_input(std::iter::empty()), JoypadInput::default());
    }
}
