//! Browser host for the visual-edit bridge.
//!
//! Built for `wasm32-unknown-unknown` and loaded into the storefront
//! preview frame. The embedding page calls the exported `start` once:
//!
//! ```js
//! import init, { start } from "./turbo_bridge_web.js";
//! await init();
//! start({ scrollDebounceMs: 16, logLevel: "debug" });
//! ```
//!
//! On other targets only the configuration helpers are compiled.

pub mod config;

#[cfg(target_arch = "wasm32")]
mod console;
#[cfg(target_arch = "wasm32")]
mod host;

#[cfg(target_arch = "wasm32")]
pub use console::ConsoleSink;
#[cfg(target_arch = "wasm32")]
pub use host::{WeakElement, WebHost};

pub use config::start_config;

#[cfg(target_arch = "wasm32")]
mod entry {
    use std::cell::RefCell;
    use std::rc::Rc;

    use turbo_bridge::{Bridge, BridgeError};
    use wasm_bindgen::prelude::*;

    use crate::config::start_config;
    use crate::console::ConsoleSink;
    use crate::host::WebHost;

    thread_local! {
        /// The bridge installed in this frame.
        static BRIDGE: RefCell<Option<Rc<Bridge<WebHost>>>> = const { RefCell::new(None) };
    }

    fn to_js(error: BridgeError) -> JsValue {
        JsValue::from_str(&error.to_string())
    }

    /// Install the bridge. Later calls in the same frame do nothing.
    ///
    /// `config` is a configuration object or its JSON text; `undefined`
    /// and `null` select defaults.
    #[wasm_bindgen]
    pub fn start(config: JsValue) -> Result<(), JsValue> {
        console_error_panic_hook::set_once();

        if BRIDGE.with(|slot| slot.borrow().is_some()) {
            return Ok(());
        }

        let json = if config.is_undefined() || config.is_null() {
            None
        } else if let Some(text) = config.as_string() {
            Some(text)
        } else {
            Some(
                js_sys::JSON::stringify(&config)?
                    .as_string()
                    .unwrap_or_default(),
            )
        };
        let config = start_config(json.as_deref()).map_err(to_js)?;

        let logger = config
            .logger("visual-edit")
            .with_sink(Rc::new(ConsoleSink));
        let host = Rc::new(WebHost::new().map_err(to_js)?);
        let bridge = Rc::new(Bridge::new(host, &config, logger));
        bridge.attach().map_err(to_js)?;

        BRIDGE.with(|slot| *slot.borrow_mut() = Some(bridge));
        Ok(())
    }

    /// Whether `start` has installed a bridge in this frame.
    #[wasm_bindgen(js_name = isStarted)]
    pub fn is_started() -> bool {
        BRIDGE.with(|slot| slot.borrow().is_some())
    }
}

#[cfg(target_arch = "wasm32")]
pub use entry::{is_started, start};
