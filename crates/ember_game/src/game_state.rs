//! Screen ownership and per-frame dispatch.
//!
//! `GameState` owns every registered screen and tracks at most one active
//! screen as a key into the map, so removal invalidates the active
//! reference in exactly one place. Events, updates, and renders are
//! forwarded to the active screen only, in that order each frame.

use std::collections::HashMap;

use ember_assets::{RealizeTexture, ResourceError, ResourceManager};
use ember_core::input::ScreenEvent;
use ember_render::SpriteBatch;

use crate::screen::Screen;

pub struct GameState<R: RealizeTexture> {
    screens: HashMap<String, Box<dyn Screen<R>>>,
    active: Option<String>,
}

impl<R: RealizeTexture> GameState<R> {
    pub fn new() -> Self {
        Self {
            screens: HashMap::new(),
            active: None,
        }
    }

    /// Register a screen under `name`. Re-registering an existing name
    /// replaces (and drops) the old screen; the active screen keeps
    /// pointing at the name, so the replacement takes over dispatch.
    pub fn add_screen<S>(&mut self, name: impl Into<String>, screen: S)
    where
        S: Screen<R> + 'static,
    {
        let name = name.into();
        if self
            .screens
            .insert(name.clone(), Box::new(screen))
            .is_some()
        {
            log::warn!("Screen '{name}' was already registered and has been replaced");
        }
    }

    /// Remove and drop the named screen. Removing the active screen
    /// unloads it first and clears the active reference.
    pub fn remove_screen(&mut self, name: &str, resources: &mut ResourceManager<R>) {
        let Some(mut screen) = self.screens.remove(name) else {
            return;
        };
        if self.active.as_deref() == Some(name) {
            screen.unload_resources(resources);
            self.active = None;
            log::info!("Active screen '{name}' removed, no screen is active");
        }
    }

    /// Activate the named screen: unload the outgoing one, load the
    /// incoming one, mark it active. An unregistered name is a routine
    /// no-op. A load failure propagates and leaves no screen active.
    pub fn set_active_screen(
        &mut self,
        name: &str,
        resources: &mut ResourceManager<R>,
    ) -> Result<(), ResourceError> {
        if !self.screens.contains_key(name) {
            log::debug!("set_active_screen: no screen named '{name}', ignoring");
            return Ok(());
        }

        if let Some(outgoing) = self.active.take() {
            if let Some(screen) = self.screens.get_mut(&outgoing) {
                screen.unload_resources(resources);
            }
        }

        if let Some(screen) = self.screens.get_mut(name) {
            screen.load_resources(resources)?;
            self.active = Some(name.to_string());
            log::info!("Screen '{name}' is now active");
        }
        Ok(())
    }

    pub fn active_screen(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    pub fn handle_event(&mut self, event: &ScreenEvent) {
        let Some(name) = self.active.as_deref() else {
            return;
        };
        if let Some(screen) = self.screens.get_mut(name) {
            screen.handle_event(event);
        }
    }

    pub fn update(&mut self, dt: f32) {
        let Some(name) = self.active.as_deref() else {
            return;
        };
        if let Some(screen) = self.screens.get_mut(name) {
            screen.update(dt);
        }
    }

    pub fn render(&mut self, batch: &mut SpriteBatch) {
        let Some(name) = self.active.as_deref() else {
            return;
        };
        if let Some(screen) = self.screens.get_mut(name) {
            screen.render(batch);
        }
    }
}

impl<R: RealizeTexture> Default for GameState<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::input::Key;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct NullRealizer;

    impl RealizeTexture for NullRealizer {
        type Texture = ();

        fn realize(&self, _image: &image::DynamicImage, _label: &str) -> Result<(), String> {
            Ok(())
        }
    }

    type CallLog = Rc<RefCell<Vec<String>>>;

    struct RecordingScreen {
        name: &'static str,
        calls: CallLog,
        fail_load: bool,
    }

    impl RecordingScreen {
        fn new(name: &'static str, calls: &CallLog) -> Self {
            Self {
                name,
                calls: Rc::clone(calls),
                fail_load: false,
            }
        }

        fn failing(name: &'static str, calls: &CallLog) -> Self {
            Self {
                name,
                calls: Rc::clone(calls),
                fail_load: true,
            }
        }

        fn record(&self, what: &str) {
            self.calls.borrow_mut().push(format!("{}:{}", self.name, what));
        }
    }

    impl Screen<NullRealizer> for RecordingScreen {
        fn load_resources(
            &mut self,
            _resources: &mut ResourceManager<NullRealizer>,
        ) -> Result<(), ResourceError> {
            self.record("load");
            if self.fail_load {
                return Err(ResourceError::NotFound {
                    folder: "textures",
                    file_name: "missing.png".to_string(),
                });
            }
            Ok(())
        }

        fn unload_resources(&mut self, _resources: &mut ResourceManager<NullRealizer>) {
            self.record("unload");
        }

        fn handle_event(&mut self, _event: &ScreenEvent) {
            self.record("event");
        }

        fn update(&mut self, _dt: f32) {
            self.record("update");
        }

        fn render(&mut self, _batch: &mut SpriteBatch) {
            self.record("render");
        }
    }

    fn new_manager() -> ResourceManager<NullRealizer> {
        ResourceManager::new("assets/base", NullRealizer)
    }

    #[test]
    fn activation_loads_once_and_dispatch_targets_only_the_active_screen() {
        let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mut resources = new_manager();
        let mut state = GameState::new();
        state.add_screen("menu", RecordingScreen::new("menu", &calls));
        state.add_screen("play", RecordingScreen::new("play", &calls));

        state
            .set_active_screen("menu", &mut resources)
            .expect("activation should succeed");
        state.handle_event(&ScreenEvent::KeyPressed(Key::Enter));
        state.update(1.0 / 60.0);
        let mut batch = SpriteBatch::new();
        state.render(&mut batch);

        assert_eq!(
            *calls.borrow(),
            vec!["menu:load", "menu:event", "menu:update", "menu:render"]
        );
        assert!(calls.borrow().iter().all(|c| !c.starts_with("play:")));
    }

    #[test]
    fn set_active_on_unregistered_name_is_a_silent_no_op() {
        let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mut resources = new_manager();
        let mut state = GameState::new();
        state.add_screen("menu", RecordingScreen::new("menu", &calls));
        state
            .set_active_screen("menu", &mut resources)
            .expect("activation should succeed");

        state
            .set_active_screen("credits", &mut resources)
            .expect("unknown name should not error");

        assert_eq!(state.active_screen(), Some("menu"));
        // The active screen was not unloaded or reloaded.
        assert_eq!(*calls.borrow(), vec!["menu:load"]);
    }

    #[test]
    fn switching_screens_unloads_the_outgoing_one() {
        let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mut resources = new_manager();
        let mut state = GameState::new();
        state.add_screen("menu", RecordingScreen::new("menu", &calls));
        state.add_screen("play", RecordingScreen::new("play", &calls));

        state.set_active_screen("menu", &mut resources).expect("menu");
        state.set_active_screen("play", &mut resources).expect("play");

        assert_eq!(
            *calls.borrow(),
            vec!["menu:load", "menu:unload", "play:load"]
        );
        assert_eq!(state.active_screen(), Some("play"));
    }

    #[test]
    fn removing_the_active_screen_stops_dispatch() {
        let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mut resources = new_manager();
        let mut state = GameState::new();
        state.add_screen("menu", RecordingScreen::new("menu", &calls));
        state.set_active_screen("menu", &mut resources).expect("menu");

        state.remove_screen("menu", &mut resources);

        assert_eq!(state.active_screen(), None);
        assert_eq!(state.screen_count(), 0);
        assert!(calls.borrow().contains(&"menu:unload".to_string()));

        let before = calls.borrow().len();
        state.update(1.0 / 60.0);
        let mut batch = SpriteBatch::new();
        state.render(&mut batch);
        state.handle_event(&ScreenEvent::KeyPressed(Key::Space));
        assert_eq!(calls.borrow().len(), before);
    }

    #[test]
    fn removing_an_inactive_screen_keeps_the_active_one() {
        let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mut resources = new_manager();
        let mut state = GameState::new();
        state.add_screen("menu", RecordingScreen::new("menu", &calls));
        state.add_screen("play", RecordingScreen::new("play", &calls));
        state.set_active_screen("menu", &mut resources).expect("menu");

        state.remove_screen("play", &mut resources);

        assert_eq!(state.active_screen(), Some("menu"));
        state.update(1.0 / 60.0);
        assert!(calls.borrow().contains(&"menu:update".to_string()));
    }

    #[test]
    fn dispatch_is_a_no_op_with_no_active_screen() {
        let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mut state = GameState::new();
        state.add_screen("menu", RecordingScreen::new("menu", &calls));

        state.handle_event(&ScreenEvent::KeyPressed(Key::Enter));
        state.update(1.0 / 60.0);
        let mut batch = SpriteBatch::new();
        state.render(&mut batch);

        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn re_adding_a_name_replaces_the_screen() {
        let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mut resources = new_manager();
        let mut state = GameState::new();
        state.add_screen("menu", RecordingScreen::new("menu_old", &calls));
        state.add_screen("menu", RecordingScreen::new("menu_new", &calls));

        assert_eq!(state.screen_count(), 1);
        state.set_active_screen("menu", &mut resources).expect("menu");
        assert_eq!(*calls.borrow(), vec!["menu_new:load"]);
    }

    #[test]
    fn load_failure_propagates_and_leaves_nothing_active() {
        let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mut resources = new_manager();
        let mut state = GameState::new();
        state.add_screen("menu", RecordingScreen::new("menu", &calls));
        state.add_screen("broken", RecordingScreen::failing("broken", &calls));
        state.set_active_screen("menu", &mut resources).expect("menu");

        let err = state
            .set_active_screen("broken", &mut resources)
            .expect_err("failing load should propagate");
        assert!(matches!(err, ResourceError::NotFound { .. }));
        assert_eq!(state.active_screen(), None);

        let before = calls.borrow().len();
        state.update(1.0 / 60.0);
        assert_eq!(calls.borrow().len(), before);
    }
}
