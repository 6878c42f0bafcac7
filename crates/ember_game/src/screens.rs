//! Built-in screens: the title menu and the gameplay view.

use ember_assets::{RealizeTexture, ResourceError, ResourceKind, ResourceManager};
use ember_core::input::{Key, ScreenEvent};
use ember_render::{QuadSpec, SpriteBatch};

use crate::screen::Screen;

pub const MENU_BACKGROUND_KEY: &str = "menu/background";
pub const PLAYER_KEY: &str = "play/player";

const PLAYER_SPEED: f32 = 180.0;
const PLAYER_SIZE: f32 = 32.0;

pub struct MenuScreen {
    background_loaded: bool,
    pulse_timer: f32,
}

impl MenuScreen {
    pub fn new() -> Self {
        Self {
            background_loaded: false,
            pulse_timer: 0.0,
        }
    }
}

impl Default for MenuScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RealizeTexture> Screen<R> for MenuScreen {
    fn load_resources(&mut self, resources: &mut ResourceManager<R>) -> Result<(), ResourceError> {
        resources.load_resource(
            ResourceKind::Texture,
            "menu_background.png",
            MENU_BACKGROUND_KEY,
        )?;
        self.background_loaded = true;
        Ok(())
    }

    fn unload_resources(&mut self, _resources: &mut ResourceManager<R>) {
        self.background_loaded = false;
        self.pulse_timer = 0.0;
    }

    fn handle_event(&mut self, event: &ScreenEvent) {
        if let ScreenEvent::KeyPressed(Key::Enter) = event {
            log::info!("Menu: start requested");
        }
    }

    fn update(&mut self, dt: f32) {
        self.pulse_timer += dt;
    }

    fn render(&mut self, batch: &mut SpriteBatch) {
        if !self.background_loaded {
            return;
        }
        // Slow brightness pulse so the title screen reads as alive.
        let pulse = 0.9 + 0.1 * (self.pulse_timer * 2.0).sin();
        batch.push_quad(QuadSpec {
            texture_key: MENU_BACKGROUND_KEY,
            center_x: 0.0,
            center_y: 0.0,
            width: 640.0,
            height: 400.0,
            color: [pulse, pulse, pulse, 1.0],
        });
    }
}

pub struct PlayScreen {
    player_loaded: bool,
    x: f32,
    y: f32,
    move_x: f32,
    move_y: f32,
}

impl PlayScreen {
    pub fn new() -> Self {
        Self {
            player_loaded: false,
            x: 0.0,
            y: 0.0,
            move_x: 0.0,
            move_y: 0.0,
        }
    }
}

impl Default for PlayScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RealizeTexture> Screen<R> for PlayScreen {
    fn load_resources(&mut self, resources: &mut ResourceManager<R>) -> Result<(), ResourceError> {
        resources.load_resource(ResourceKind::Texture, "player.png", PLAYER_KEY)?;
        self.player_loaded = true;
        Ok(())
    }

    fn unload_resources(&mut self, _resources: &mut ResourceManager<R>) {
        self.player_loaded = false;
        self.x = 0.0;
        self.y = 0.0;
        self.move_x = 0.0;
        self.move_y = 0.0;
    }

    fn handle_event(&mut self, event: &ScreenEvent) {
        match event {
            ScreenEvent::KeyPressed(key) => match key {
                Key::A | Key::Left => self.move_x = -1.0,
                Key::D | Key::Right => self.move_x = 1.0,
                Key::S | Key::Down => self.move_y = -1.0,
                Key::W | Key::Up => self.move_y = 1.0,
                _ => {}
            },
            ScreenEvent::KeyReleased(key) => match key {
                Key::A | Key::Left if self.move_x < 0.0 => self.move_x = 0.0,
                Key::D | Key::Right if self.move_x > 0.0 => self.move_x = 0.0,
                Key::S | Key::Down if self.move_y < 0.0 => self.move_y = 0.0,
                Key::W | Key::Up if self.move_y > 0.0 => self.move_y = 0.0,
                _ => {}
            },
        }
    }

    fn update(&mut self, dt: f32) {
        self.x += self.move_x * PLAYER_SPEED * dt;
        self.y += self.move_y * PLAYER_SPEED * dt;
    }

    fn render(&mut self, batch: &mut SpriteBatch) {
        if !self.player_loaded {
            return;
        }
        batch.push_quad(QuadSpec {
            texture_key: PLAYER_KEY,
            center_x: self.x,
            center_y: self.y,
            width: PLAYER_SIZE,
            height: PLAYER_SIZE,
            color: [1.0, 1.0, 1.0, 1.0],
        });
    }
}
