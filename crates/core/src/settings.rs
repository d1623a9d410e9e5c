//! Viewer settings read by the viewport controller
//!
//! Settings are read-only inputs here. They can be loaded from a JSON file,
//! from `DOCVIEW_*` environment variables, or built in code.

use std::fs;
use std::path::Path;

use docview_cache::config::env_usize;
use docview_cache::ConfigError;
use serde::{Deserialize, Serialize};

/// Largest fraction of the viewport treated as a tap-to-scroll edge
pub const MAX_EDGE_FRACTION: f32 = 0.5;

/// How pages are scaled to the viewport at zoom 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageAlign {
    /// Page width fills the viewport width
    #[default]
    Width,
    /// Page height fills the viewport height
    Height,
    /// Whole page fits in the viewport
    Auto,
}

impl PageAlign {
    /// Scale applied to a page of `page_width` x `page_height` so it aligns to
    /// a viewport of `view_width` x `view_height`
    ///
    /// An unsized viewport leaves pages at their natural size.
    pub fn scale(
        &self,
        page_width: f32,
        page_height: f32,
        view_width: f32,
        view_height: f32,
    ) -> f32 {
        if view_width <= 0.0 || view_height <= 0.0 || page_width <= 0.0 || page_height <= 0.0 {
            return 1.0;
        }
        let by_width = view_width / page_width;
        let by_height = view_height / page_height;
        match self {
            PageAlign::Width => by_width,
            PageAlign::Height => by_height,
            PageAlign::Auto => by_width.min(by_height),
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "width" => Some(PageAlign::Width),
            "height" => Some(PageAlign::Height),
            "auto" => Some(PageAlign::Auto),
            _ => None,
        }
    }
}

/// Viewer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub page_align: PageAlign,

    /// Double tap toggles the zoom controls
    pub zoom_by_double_tap: bool,

    /// Taps near the top or bottom edge scroll by a page unit
    pub tap_scroll: bool,

    /// Height of the tap-to-scroll edge zone, percent of the viewport
    pub tap_size: u32,

    /// Distance of a paged scroll, percent of the viewport height
    pub scroll_height: u32,

    /// Page shown when the document is first laid out
    pub current_page: usize,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            page_align: PageAlign::Width,
            zoom_by_double_tap: true,
            tap_scroll: true,
            tap_size: 10,
            scroll_height: 50,
            current_page: 0,
        }
    }
}

impl ViewerSettings {
    pub fn with_page_align(mut self, align: PageAlign) -> Self {
        self.page_align = align;
        self
    }

    pub fn with_current_page(mut self, page: usize) -> Self {
        self.current_page = page;
        self
    }

    pub fn with_tap_scroll(mut self, enabled: bool, tap_size: u32) -> Self {
        self.tap_scroll = enabled;
        self.tap_size = tap_size;
        self
    }

    /// Edge zone as a fraction of the viewport, at most one half
    pub fn edge_fraction(&self) -> f32 {
        (self.tap_size as f32 / 100.0).min(MAX_EDGE_FRACTION)
    }

    /// Paged scroll distance as a fraction of the viewport height
    pub fn scroll_fraction(&self) -> f32 {
        self.scroll_height as f32 / 100.0
    }

    /// Loads settings from environment variables over the defaults.
    ///
    /// Environment variables:
    /// - `DOCVIEW_PAGE_ALIGN`: `width`, `height` or `auto`
    /// - `DOCVIEW_ZOOM_BY_DOUBLE_TAP`: `true`/`false`
    /// - `DOCVIEW_TAP_SCROLL`: `true`/`false`
    /// - `DOCVIEW_TAP_SIZE`: edge zone percent
    /// - `DOCVIEW_SCROLL_HEIGHT`: paged scroll percent
    /// - `DOCVIEW_CURRENT_PAGE`: start page
    ///
    /// # Errors
    /// Returns an error if any variable holds an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Ok(value) = std::env::var("DOCVIEW_PAGE_ALIGN") {
            settings.page_align = PageAlign::parse(&value)
                .ok_or_else(|| ConfigError::InvalidValue("DOCVIEW_PAGE_ALIGN".to_string()))?;
        }
        if let Some(flag) = env_bool("DOCVIEW_ZOOM_BY_DOUBLE_TAP")? {
            settings.zoom_by_double_tap = flag;
        }
        if let Some(flag) = env_bool("DOCVIEW_TAP_SCROLL")? {
            settings.tap_scroll = flag;
        }
        if let Some(size) = env_usize("DOCVIEW_TAP_SIZE")? {
            settings.tap_size = to_percent("DOCVIEW_TAP_SIZE", size)?;
        }
        if let Some(height) = env_usize("DOCVIEW_SCROLL_HEIGHT")? {
            settings.scroll_height = to_percent("DOCVIEW_SCROLL_HEIGHT", height)?;
        }
        if let Some(page) = env_usize("DOCVIEW_CURRENT_PAGE")? {
            settings.current_page = page;
        }

        Ok(settings)
    }

    /// Loads settings from a JSON file; missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

fn env_bool(name: &str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue(name.to_string())),
        },
        Err(_) => Ok(None),
    }
}

fn to_percent(name: &str, value: usize) -> Result<u32, ConfigError> {
    u32::try_from(value).map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: [&str; 6] = [
        "DOCVIEW_PAGE_ALIGN",
        "DOCVIEW_ZOOM_BY_DOUBLE_TAP",
        "DOCVIEW_TAP_SCROLL",
        "DOCVIEW_TAP_SIZE",
        "DOCVIEW_SCROLL_HEIGHT",
        "DOCVIEW_CURRENT_PAGE",
    ];

    struct EnvGuard;

    impl EnvGuard {
        fn clean() -> Self {
            for var in VARS {
                env::remove_var(var);
            }
            EnvGuard
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for var in VARS {
                env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = ViewerSettings::default();
        assert_eq!(settings.page_align, PageAlign::Width);
        assert!(settings.tap_scroll);
        assert_eq!(settings.edge_fraction(), 0.1);
        assert_eq!(settings.scroll_fraction(), 0.5);
    }

    #[test]
    fn test_edge_fraction_capped() {
        let settings = ViewerSettings::default().with_tap_scroll(true, 80);
        assert_eq!(settings.edge_fraction(), MAX_EDGE_FRACTION);
    }

    #[test]
    fn test_align_scale() {
        assert_eq!(PageAlign::Width.scale(500.0, 1000.0, 1000.0, 800.0), 2.0);
        assert_eq!(PageAlign::Height.scale(500.0, 1000.0, 1000.0, 800.0), 0.8);
        assert_eq!(PageAlign::Auto.scale(500.0, 1000.0, 1000.0, 800.0), 0.8);
        assert_eq!(PageAlign::Auto.scale(500.0, 1000.0, 0.0, 0.0), 1.0);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let _guard = EnvGuard::clean();
        env::set_var("DOCVIEW_PAGE_ALIGN", "Auto");
        env::set_var("DOCVIEW_TAP_SCROLL", "false");
        env::set_var("DOCVIEW_TAP_SIZE", "25");
        env::set_var("DOCVIEW_CURRENT_PAGE", "7");

        let settings = ViewerSettings::from_env().unwrap();
        assert_eq!(settings.page_align, PageAlign::Auto);
        assert!(!settings.tap_scroll);
        assert_eq!(settings.tap_size, 25);
        assert_eq!(settings.current_page, 7);
        assert!(settings.zoom_by_double_tap);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_align() {
        let _guard = EnvGuard::clean();
        env::set_var("DOCVIEW_PAGE_ALIGN", "diagonal");
        assert!(matches!(
            ViewerSettings::from_env(),
            Err(ConfigError::InvalidValue(key)) if key == "DOCVIEW_PAGE_ALIGN"
        ));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_flag() {
        let _guard = EnvGuard::clean();
        env::set_var("DOCVIEW_ZOOM_BY_DOUBLE_TAP", "maybe");
        assert!(ViewerSettings::from_env().is_err());
    }

    #[test]
    fn test_file_with_missing_keys() {
        let path = env::temp_dir().join(format!("docview-settings-{}.json", std::process::id()));
        fs::write(&path, r#"{ "page_align": "height", "scroll_height": 90 }"#).unwrap();

        let settings = ViewerSettings::from_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(settings.page_align, PageAlign::Height);
        assert_eq!(settings.scroll_height, 90);
        assert_eq!(settings.tap_size, ViewerSettings::default().tap_size);
    }

    #[test]
    fn test_save_and_load() {
        let path = env::temp_dir().join(format!("docview-settings-rt-{}.json", std::process::id()));
        let settings = ViewerSettings::default()
            .with_page_align(PageAlign::Auto)
            .with_current_page(3);
        settings.save_to_file(&path).unwrap();
        let loaded = ViewerSettings::from_file(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
    }
}
