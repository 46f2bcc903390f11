//! Print how arena settings are resolved before reaching the engine.

use dreamer_rl::ArenaConfig;
use serde_json::json;

pub fn run() {
    let config = ArenaConfig::new("doapp")
        .with_action_space("MULTI_DISCRETE")
        .with_screen_size(64, 64)
        .with_grayscale(true)
        .with_sticky_actions(4)
        .with_setting("frame_shape", json!([128, 128, 1]))
        .with_setting("step_ratio", json!(6))
        .with_wrapper("frame_stack", json!(4));

    let resolved = config.resolve();
    let out = json!({
        "settings": resolved.settings,
        "wrappers": resolved.wrappers,
    });

    match serde_json::to_string_pretty(&out) {
        Ok(text) => println!("{}", text),
        Err(e) => log::error!("failed to render settings: {}", e),
    }
}
