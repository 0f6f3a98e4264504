//! Configuration for usfm-strip
//!
//! Settings are loaded from `usfm-strip.toml` in the working directory, or
//! from the file given with `--config`:
//!
//! ```toml
//! [input]
//! extension = "usfm"
//!
//! [output]
//! directory = "unaligned"
//! suffix = ""
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

mod settings;


pub use settings::{InputSettings, OutputSettings, Settings, CONFIG_CANDIDATES};
