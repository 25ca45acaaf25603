//! Host-side state of the isolated preview surface.
//!
//! The frame never guesses its own height: it starts from a default for each
//! new markup value and afterwards only moves in response to resize messages
//! reported by the isolated document. Messages are applied last-write-wins.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSettings {
    pub min_height: u32,
    pub max_height: u32,
    pub default_height: u32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            min_height: 200,
            max_height: 800,
            default_height: 400,
        }
    }
}

impl PreviewSettings {
    /// Clamps a reported height into `[min_height, max_height]`.
    ///
    /// Returns `None` for values that are not numbers at all (NaN, infinity);
    /// everything else is clamped, never rejected.
    pub fn clamp_height(&self, reported: f64) -> Option<u32> {
        if !reported.is_finite() {
            return None;
        }
        let clamped = reported
            .round()
            .clamp(f64::from(self.min_height), f64::from(self.max_height));
        Some(clamped as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewState {
    #[default]
    Loading,
    Empty,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFrame {
    settings: PreviewSettings,
    state: PreviewState,
    measured_height: u32,
    markup: Option<String>,
    generation: u64,
}

impl Default for PreviewFrame {
    fn default() -> Self {
        Self::new(PreviewSettings::default())
    }
}

impl PreviewFrame {
    pub fn new(settings: PreviewSettings) -> Self {
        Self {
            settings,
            state: PreviewState::Loading,
            measured_height: settings.default_height,
            markup: None,
            generation: 0,
        }
    }

    /// Drives the state machine for one render request.
    ///
    /// Returns true when the isolated document must be (re)built, which
    /// happens exactly when a new non-blank markup value reaches `Ready`.
    pub fn render(&mut self, markup: Option<&str>, conversion_in_flight: bool) -> bool {
        if conversion_in_flight {
            self.state = PreviewState::Loading;
            self.markup = None;
            return false;
        }

        let markup = match markup {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                self.state = PreviewState::Empty;
                self.markup = None;
                return false;
            }
        };

        if self.state == PreviewState::Ready && self.markup.as_deref() == Some(markup) {
            return false;
        }

        self.markup = Some(markup.to_string());
        self.state = PreviewState::Ready;
        self.measured_height = self.settings.default_height;
        self.generation += 1;
        true
    }

    /// Applies a height reported by the isolated document. Ignored unless
    /// content is being shown.
    pub fn apply_resize(&mut self, reported: f64) -> Option<u32> {
        if self.state != PreviewState::Ready {
            return None;
        }
        let height = self.settings.clamp_height(reported)?;
        self.measured_height = height;
        Some(height)
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == PreviewState::Loading
    }

    pub fn measured_height(&self) -> u32 {
        self.measured_height
    }

    pub fn markup(&self) -> Option<&str> {
        self.markup.as_deref()
    }

    /// Increments every time new content is assigned.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn settings(&self) -> PreviewSettings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_frame() -> PreviewFrame {
        let mut frame = PreviewFrame::default();
        assert!(frame.render(Some("<div>hi</div>"), false));
        frame
    }

    #[test]
    fn heights_are_clamped_not_rejected() {
        let mut frame = ready_frame();
        assert_eq!(frame.apply_resize(50.0), Some(200));
        assert_eq!(frame.measured_height(), 200);
        assert_eq!(frame.apply_resize(5000.0), Some(800));
        assert_eq!(frame.measured_height(), 800);
        assert_eq!(frame.apply_resize(450.0), Some(450));
        assert_eq!(frame.measured_height(), 450);
        assert_eq!(frame.apply_resize(-3.0), Some(200));
    }

    #[test]
    fn non_numeric_heights_are_ignored() {
        let mut frame = ready_frame();
        frame.apply_resize(300.0);
        assert_eq!(frame.apply_resize(f64::NAN), None);
        assert_eq!(frame.apply_resize(f64::INFINITY), None);
        assert_eq!(frame.measured_height(), 300);
    }

    #[test]
    fn last_message_wins() {
        let mut frame = ready_frame();
        for height in [600.0, 250.0, 420.0] {
            frame.apply_resize(height);
        }
        assert_eq!(frame.measured_height(), 420);
    }

    #[test]
    fn blank_markup_is_empty() {
        let mut frame = PreviewFrame::default();
        assert!(!frame.render(Some("   \n"), false));
        assert_eq!(frame.state(), PreviewState::Empty);
        assert!(!frame.render(None, false));
        assert_eq!(frame.state(), PreviewState::Empty);
        assert_eq!(frame.apply_resize(500.0), None);
    }

    #[test]
    fn in_flight_conversion_shows_loading() {
        let mut frame = ready_frame();
        assert!(!frame.render(Some("<div>hi</div>"), true));
        assert!(frame.is_loading());
        assert_eq!(frame.apply_resize(500.0), None);
    }

    #[test]
    fn new_markup_resets_height_to_default() {
        let mut frame = ready_frame();
        frame.apply_resize(700.0);
        assert!(frame.render(Some("<p>other</p>"), false));
        assert_eq!(frame.measured_height(), 400);
        assert_eq!(frame.generation(), 2);
    }

    #[test]
    fn same_markup_is_terminal() {
        let mut frame = ready_frame();
        frame.apply_resize(700.0);
        assert!(!frame.render(Some("<div>hi</div>"), false));
        assert_eq!(frame.measured_height(), 700);
        assert_eq!(frame.generation(), 1);
    }
}
