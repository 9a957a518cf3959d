use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};

use crate::keyboard::{key_number, KeyEvent, Keypad, KEYMAP};

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// Display collaborator: a 64x32 monochrome buffer the interpreter
/// toggles one pixel at a time and flushes with [`Screen::present`].
pub trait Screen {
    fn set_pixel(&mut self, row: usize, col: usize, on: bool);
    fn get_pixel(&self, row: usize, col: usize) -> bool;
    /// Flush the whole buffer to the output.
    fn present(&mut self);
    fn clear(&mut self);
}

/// minifb frontend: one window serving as both screen and keypad.
pub struct FrameBuffer {
    bits: [bool; WIDTH * HEIGHT],
    pixels: Vec<u32>,
    window: Window,
}

impl FrameBuffer {
    const OFF: u32 = 0x00_0000;
    const ON: u32 = 0x00_7FFF;

    pub fn new(title: &str) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            title,
            WIDTH,
            HEIGHT,
            WindowOptions {
                scale: Scale::X16,
                ..WindowOptions::default()
            },
        )?;
        // Limit to max ~60 fps update rate
        window.limit_update_rate(Some(std::time::Duration::from_micros(16600)));
        Ok(Self {
            bits: [false; WIDTH * HEIGHT],
            pixels: vec![Self::OFF; WIDTH * HEIGHT],
            window,
        })
    }
}

impl Screen for FrameBuffer {
    fn set_pixel(&mut self, row: usize, col: usize, on: bool) {
        let i = row * WIDTH + col;
        self.bits[i] = on;
        self.pixels[i] = if on { Self::ON } else { Self::OFF };
    }

    fn get_pixel(&self, row: usize, col: usize) -> bool {
        self.bits[row * WIDTH + col]
    }

    fn present(&mut self) {
        if let Err(e) = self.window.update_with_buffer(&self.pixels, WIDTH, HEIGHT) {
            log::warn!("dropped a frame: {e}");
        }
    }

    fn clear(&mut self) {
        self.bits = [false; WIDTH * HEIGHT];
        self.pixels.fill(Self::OFF);
    }
}

impl Keypad for FrameBuffer {
    fn is_key_down(&self, key: u8) -> bool {
        KEYMAP
            .get(key as usize)
            .is_some_and(|&host| self.window.is_key_down(host))
    }

    fn poll_events(&mut self) -> KeyEvent {
        if !self.window.is_open() || self.window.is_key_down(Key::Escape) {
            return KeyEvent::Quit;
        }
        self.window.update();
        for key in self.window.get_keys_pressed(KeyRepeat::No) {
            if let Some(n) = key_number(key) {
                return KeyEvent::Pressed(n);
            }
        }
        KeyEvent::Idle
    }
}
