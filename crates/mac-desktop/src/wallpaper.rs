//! Desktop picture via AppleScript.

use std::path::Path;

use tracing::debug;

use crate::{Error, Result, WallpaperController, run};

/// Quote `s` as an AppleScript string literal.
fn applescript_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Script that sets the picture on every desktop to `path`.
pub fn set_picture_script(path: &Path) -> String {
    format!(
        "tell application \"System Events\" to tell every desktop to set picture to {}",
        applescript_string(&path.to_string_lossy())
    )
}

/// Production wallpaper controller using `osascript`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Osascript;

impl WallpaperController for Osascript {
    fn set_wallpaper(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(Error::WallpaperMissing(path.to_path_buf()));
        }
        debug!(path = %path.display(), "setting desktop picture");
        run("osascript", ["-e", &set_picture_script(path)])?;
        Ok(())
    }
}
