//! Director Browser
//!
//! The Browser Facade (multi-tab navigation, deterministic and
//! AI-assisted interaction, screenshots, profiles) and the DOM Toolkit
//! (token-efficient read-only introspection: overview, structure,
//! search, inspect, portal diffing, click-inspect) plus the
//! actionability evaluator and snapshot cache that back it.

pub mod actionability;
pub mod dom_toolkit;
pub mod driver;
pub mod facade;
pub mod mock_driver;
pub mod nth;
pub mod snapshot_cache;

pub use driver::BrowserDriver;
pub use facade::BrowserFacade;
pub use mock_driver::MockDriver;
