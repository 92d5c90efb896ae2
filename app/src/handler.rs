//! Application handler trait.

use crate::app::FrameStats;
use crate::context::AppContext;

/// Application logic driven by [`App`](crate::App).
///
/// # Lifecycle
///
/// 1. `on_init` - once, before the scene runtime starts
/// 2. `on_update` - every frame, before the scene update
/// 3. `on_draw` - every frame, after the scene was rendered
/// 4. `on_shutdown` - once, after the scene runtime stopped
///
/// # Example
///
/// ```ignore
/// use quasar_app::{App, AppContext, AppHandler, DefaultAppArgs};
///
/// struct Sandbox;
///
/// impl AppHandler for Sandbox {
///     fn on_init(&mut self, ctx: &mut AppContext) {
///         let e = ctx.scene_mut().create_entity("Crate");
///         // ... add a collider and a rigid body
///     }
/// }
/// ```
pub trait AppHandler {
    /// Populate the scene and register script hosts here.
    fn on_init(&mut self, _ctx: &mut AppContext) {}

    /// Returns `true` to continue running, `false` to exit.
    fn on_update(&mut self, _ctx: &mut AppContext) -> bool {
        true
    }

    /// Receives the draw statistics of the frame.
    fn on_draw(&mut self, _ctx: &AppContext, _stats: &FrameStats) {}

    fn on_shutdown(&mut self, _ctx: &mut AppContext) {}
}

impl<H: AppHandler + ?Sized> AppHandler for &mut H {
    fn on_init(&mut self, ctx: &mut AppContext) {
        (**self).on_init(ctx);
    }

    fn on_update(&mut self, ctx: &mut AppContext) -> bool {
        (**self).on_update(ctx)
    }

    fn on_draw(&mut self, ctx: &AppContext, stats: &FrameStats) {
        (**self).on_draw(ctx, stats);
    }

    fn on_shutdown(&mut self, ctx: &mut AppContext) {
        (**self).on_shutdown(ctx);
    }
}
