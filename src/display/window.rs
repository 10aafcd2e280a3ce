// Main window and emulation loop
//
// winit 0.30 application-handler style: the window and surface are created
// on `resumed`, each `RedrawRequested` advances the emulator by the elapsed
// wall time (clamped so a long stall doesn't snowball) and blits the PPU's
// front buffer.
//
// Hotkeys: Escape quits, P pauses, F8 resets, F12 saves a screenshot.

use crate::display::keyboard::{KeyboardMapping, KeyboardState};
use crate::emulator::{save_screenshot, EmulatorConfig, Nes};
use crate::error::FrontendError;
use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};
use log::{error, info, warn};
use pixels::{Pixels, SurfaceTexture};
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Longest stretch of wall time fed into one redraw (4 NTSC frames)
const MAX_FRAME_TIME: f64 = 4.0 / 60.0;

struct EmulatorApp {
    nes: Nes,
    config: EmulatorConfig,
    mapping: KeyboardMapping,
    keyboard: KeyboardState,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    last_frame: Instant,
    paused: bool,
}

impl EmulatorApp {
    fn new(nes: Nes, config: EmulatorConfig) -> Self {
        let mapping = KeyboardMapping::from_config(&config.input);
        EmulatorApp {
            nes,
            config,
            mapping,
            keyboard: KeyboardState::new(),
            window: None,
            pixels: None,
            last_frame: Instant::now(),
            paused: false,
        }
    }

    fn handle_hotkey(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyP => {
                self.paused = !self.paused;
                info!("{}", if self.paused { "paused" } else { "resumed" });
            }
            KeyCode::F8 => {
                self.nes.reset();
                info!("console reset");
            }
            KeyCode::F12 => {
                if let Err(err) = save_screenshot(self.nes.frame()) {
                    warn!("screenshot failed: {}", err);
                }
            }
            _ => {}
        }
    }

    fn redraw(&mut self) {
        let elapsed = self.last_frame.elapsed().as_secs_f64();
        self.last_frame = Instant::now();

        if !self.paused {
            let buttons = self.mapping.buttons(self.keyboard.pressed());
            self.nes.set_buttons(buttons, 0);
            self.nes.emulate(elapsed.min(MAX_FRAME_TIME));
        }

        if let Some(pixels) = &mut self.pixels {
            let frame = self.nes.frame();
            for (dst, &src) in pixels.frame_mut().chunks_exact_mut(4).zip(frame) {
                dst[0] = (src >> 16) as u8; // R
                dst[1] = (src >> 8) as u8; // G
                dst[2] = src as u8; // B
                dst[3] = (src >> 24) as u8; // A
            }
            if let Err(err) = pixels.render() {
                error!("render failed: {}", err);
            }
        }
    }
}

impl ApplicationHandler for EmulatorApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let scale = self.config.scale();
        let size = LogicalSize::new(
            SCREEN_WIDTH as u32 * scale,
            SCREEN_HEIGHT as u32 * scale,
        );
        let attributes = Window::default_attributes()
            .with_title("famicore")
            .with_inner_size(size)
            .with_resizable(false);

        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .expect("window creation"),
        );
        let inner = window.inner_size();
        let surface = SurfaceTexture::new(inner.width, inner.height, window.clone());
        let pixels = Pixels::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, surface)
            .expect("pixel surface creation");

        self.window = Some(window);
        self.pixels = Some(pixels);
        self.last_frame = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        state,
                        repeat,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    self.keyboard.press(physical_key);
                    if !repeat {
                        if let PhysicalKey::Code(code) = physical_key {
                            self.handle_hotkey(code, event_loop);
                        }
                    }
                }
                ElementState::Released => self.keyboard.release(physical_key),
            },
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Clean shutdown: battery saves go to disk here
        self.nes.save_sram();
    }
}

/// Open the window and run the emulator until the user quits.
pub fn run(nes: Nes, config: EmulatorConfig) -> Result<(), FrontendError> {
    let event_loop =
        EventLoop::new().map_err(|e| FrontendError::VideoInitFailure(e.to_string()))?;
    event_loop.set_control_flow(if config.video.vsync {
        ControlFlow::Wait
    } else {
        ControlFlow::Poll
    });

    let mut app = EmulatorApp::new(nes, config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| FrontendError::VideoInitFailure(e.to_string()))
}
