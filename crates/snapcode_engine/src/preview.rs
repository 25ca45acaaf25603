//! Isolated live preview of untrusted generated markup.
//!
//! The markup runs inside an `<iframe srcdoc>` whose sandbox allows scripts
//! but not same-origin access, top-level navigation, forms or popups. A
//! guard script inside the isolated document cancels navigation and
//! submission, and reports the content height to the host with a single
//! fire-and-forget message type, `{ type: "resize", height }`.
use serde::Deserialize;
use snapcode_core::{PreviewFrame, PreviewSettings, PreviewState};
use snapcode_logging::snap_trace;

/// Utility-class stylesheet used by both the preview and the export.
pub const UTILITY_STYLESHEET_URL: &str = "https://cdn.tailwindcss.com";

/// Sandbox tokens for the preview frame. Scripts only: without
/// `allow-same-origin` the document gets an opaque origin and cannot reach
/// the host except through `postMessage`.
pub const SANDBOX_POLICY: &str = "allow-scripts";

pub const PREVIEW_FRAME_ID: &str = "snapcode-preview";

const RESET_STYLE: &str = r##"<style>
  body {
    margin: 0;
    padding: 2rem;
    background: linear-gradient(135deg, #f8fafc 0%, #e2e8f0 100%);
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
    line-height: 1.6;
  }
  body > * { margin-bottom: 1.5rem; }
  body > *:last-child { margin-bottom: 0; }
  button, [role="button"], .btn { cursor: pointer; }
  a[href="#"], a[href=""], a:not([href]) { pointer-events: none; color: inherit; text-decoration: none; }
</style>"##;

const GUARD_SCRIPT: &str = r#"<script>
(function () {
  'use strict';
  var PRESSABLE = 'button, [role="button"]';

  // Content height only; the frame's own viewport must not feed back in.
  function reportHeight() {
    var body = document.body;
    if (!body) { return; }
    var height = Math.max(
      body.scrollHeight,
      body.offsetHeight,
      Math.ceil(body.getBoundingClientRect().height)
    );
    window.parent.postMessage({ type: 'resize', height: height + 40 }, '*');
  }

  function closest(target, selector) {
    return target && target.closest ? target.closest(selector) : null;
  }

  function installGuards() {
    document.addEventListener('submit', function (event) {
      event.preventDefault();
      event.stopPropagation();
    }, true);

    document.addEventListener('click', function (event) {
      if (closest(event.target, 'a')) {
        event.preventDefault();
      }
      var pressed = closest(event.target, PRESSABLE);
      if (pressed) {
        event.preventDefault();
        pressed.style.transform = 'scale(0.95)';
        setTimeout(function () { pressed.style.transform = ''; }, 100);
      }
    }, true);

    window.addEventListener('beforeunload', function (event) {
      event.preventDefault();
      return false;
    });
  }

  function installMeasurement() {
    if (window.MutationObserver) {
      new MutationObserver(reportHeight).observe(document.body, {
        childList: true,
        subtree: true,
        attributes: true
      });
    }
    window.addEventListener('load', reportHeight);
    window.addEventListener('resize', reportHeight);
    document.addEventListener('load', function (event) {
      if (event.target && event.target.tagName === 'IMG') { reportHeight(); }
    }, true);
    document.addEventListener('error', function (event) {
      if (event.target && event.target.tagName === 'IMG') { reportHeight(); }
    }, true);
    setTimeout(reportHeight, 100);
  }

  installGuards();
  if (document.readyState === 'loading') {
    document.addEventListener('DOMContentLoaded', installMeasurement);
  } else {
    installMeasurement();
  }
})();
</script>"#;

/// Wraps a fragment into the complete isolated document. The guard script
/// sits in `<head>` so it is installed before any of the fragment is parsed;
/// an unclosed comment or script in the fragment cannot swallow it.
pub fn build_isolated_document(markup: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
<title>Live Preview</title>\n<script src=\"{UTILITY_STYLESHEET_URL}\"></script>\n{RESET_STYLE}\n\
{GUARD_SCRIPT}\n</head>\n<body>\n{markup}\n</body>\n</html>\n"
    )
}

/// Escapes text for use inside a double-quoted attribute value.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + value.len() / 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// The only message the isolated document sends to the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PreviewMessage {
    Resize { height: f64 },
}

/// Parses a message posted by the isolated document. Anything that is not a
/// well-formed resize message is ignored.
pub fn parse_preview_message(raw: &str) -> Option<PreviewMessage> {
    serde_json::from_str(raw).ok()
}

/// Owns the preview frame and the isolated document built for it.
#[derive(Debug, Clone, Default)]
pub struct PreviewRenderer {
    frame: PreviewFrame,
    document: Option<String>,
}

impl PreviewRenderer {
    pub fn new(settings: PreviewSettings) -> Self {
        Self {
            frame: PreviewFrame::new(settings),
            document: None,
        }
    }

    /// Renders `markup`, or the loading state while a conversion is in flight.
    pub fn render(&mut self, markup: Option<&str>, conversion_in_flight: bool) -> &PreviewFrame {
        if self.frame.render(markup, conversion_in_flight) {
            self.document = self.frame.markup().map(build_isolated_document);
        } else if self.frame.state() != PreviewState::Ready {
            self.document = None;
        }
        &self.frame
    }

    /// Applies a raw message from the isolated document; returns the new
    /// height when it was a resize.
    pub fn on_message(&mut self, raw: &str) -> Option<u32> {
        let PreviewMessage::Resize { height } = parse_preview_message(raw)?;
        let applied = self.frame.apply_resize(height);
        snap_trace!("Preview resize {} -> {:?}", height, applied);
        applied
    }

    pub fn frame(&self) -> &PreviewFrame {
        &self.frame
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// The sandboxed `<iframe>` element for the current content.
    pub fn iframe_element(&self) -> Option<String> {
        let document = self.document.as_deref()?;
        Some(format!(
            "<iframe id=\"{PREVIEW_FRAME_ID}\" title=\"Live Code Preview\" sandbox=\"{SANDBOX_POLICY}\" \
style=\"width:100%;border:0;background:#fff;height:{}px\" srcdoc=\"{}\"></iframe>",
            self.frame.measured_height(),
            escape_attribute(document)
        ))
    }
}

/// A standalone host page embedding the isolated preview of `markup`, with a
/// listener that applies clamped resize messages from that frame only.
pub fn render_host_page(markup: &str, settings: PreviewSettings) -> Option<String> {
    let mut renderer = PreviewRenderer::new(settings);
    renderer.render(Some(markup), false);
    let iframe = renderer.iframe_element()?;
    let min = settings.min_height;
    let max = settings.max_height;
    Some(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Snapcode Preview</title>
</head>
<body style="margin:0;padding:1rem;background:#f1f5f9">
{iframe}
<script>
(function () {{
  var frame = document.getElementById('{PREVIEW_FRAME_ID}');
  window.addEventListener('message', function (event) {{
    if (event.source !== frame.contentWindow) {{ return; }}
    var data = event.data;
    if (!data || data.type !== 'resize' || typeof data.height !== 'number' || !isFinite(data.height)) {{ return; }}
    var height = Math.min(Math.max(Math.round(data.height), {min}), {max});
    frame.style.height = height + 'px';
  }});
}})();
</script>
</body>
</html>
"#
    ))
}
