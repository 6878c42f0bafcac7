use ember_assets::{RealizeTexture, ResourceError, ResourceManager};
use ember_core::input::ScreenEvent;
use ember_render::SpriteBatch;

/// One self-contained unit of game UI/logic (a menu, the gameplay view).
///
/// All five capabilities are required; there are no default bodies. A
/// screen never stores the resource manager: the game state passes it in
/// for the lifecycle calls, so ownership stays with the host.
pub trait Screen<R: RealizeTexture> {
    /// Called when the screen becomes active. Load failures propagate to
    /// whoever requested the activation.
    fn load_resources(&mut self, resources: &mut ResourceManager<R>) -> Result<(), ResourceError>;

    /// Called when the screen stops being active or is removed. Clears
    /// per-screen state; cached assets stay owned by the manager.
    fn unload_resources(&mut self, resources: &mut ResourceManager<R>);

    fn handle_event(&mut self, event: &ScreenEvent);

    fn update(&mut self, dt: f32);

    fn render(&mut self, batch: &mut SpriteBatch);
}
