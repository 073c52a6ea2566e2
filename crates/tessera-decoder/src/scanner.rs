//! Marker scanner for reasoning-tagged streams.
//!
//! Models that narrate before answering wrap the narration in one of
//! `<think>`, `<thinking>` or `<reasoning>`. Deltas arrive at arbitrary
//! boundaries, so a marker can be split across chunks. The scanner holds
//! back the shortest suffix that could still become a marker and emits
//! everything else immediately.

use tracing::trace;

const MARKERS: [&str; 3] = ["think", "thinking", "reasoning"];

/// A classified piece of stream content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Content inside a reasoning block.
    Reasoning(String),
    /// The reasoning block closed.
    ReasoningEnd,
    /// Final-answer content.
    Text(String),
}

/// Incremental scanner over one model stream.
///
/// At most one reasoning block is recognized per scanner lifetime. After
/// its closing marker, all remaining input passes through as text, marker
/// lookalikes included.
#[derive(Debug)]
pub struct TagScanner {
    buffer: String,
    inside_tag: bool,
    active_tag: Option<&'static str>,
    closed: bool,
    last_marker: Option<&'static str>,
}

impl Default for TagScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl TagScanner {
    /// Scanner for a fresh stream: outside any tag, final-answer phase
    /// until an opening marker appears.
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            inside_tag: false,
            active_tag: None,
            closed: false,
            last_marker: None,
        }
    }

    /// Scanner for a continuation stream that starts mid-reasoning, as if
    /// `<marker>` had already been seen. Unrecognized names fall back to
    /// `think`.
    pub fn resume(marker: &str) -> Self {
        let tag = MARKERS
            .iter()
            .find(|m| m.eq_ignore_ascii_case(marker))
            .copied()
            .unwrap_or("think");
        Self {
            buffer: String::new(),
            inside_tag: true,
            active_tag: Some(tag),
            closed: false,
            last_marker: Some(tag),
        }
    }

    /// Marker most recently opened by this scanner, if any.
    pub fn last_marker(&self) -> Option<&'static str> {
        self.last_marker
    }

    /// Append a delta and return every fragment that is now unambiguous.
    pub fn push(&mut self, delta: &str) -> Vec<Fragment> {
        self.buffer.push_str(delta);
        self.scan(false)
    }

    /// End-of-stream flush. Held-back content, including a partial marker
    /// that never completed, is emitted under the current phase.
    pub fn finish(&mut self) -> Vec<Fragment> {
        self.scan(true)
    }

    /// Flush held-back content under the current phase without ending the
    /// stream. Used when a tool call interrupts the text flow.
    pub fn flush_pending(&mut self) -> Vec<Fragment> {
        let mut out = Vec::new();
        if !self.buffer.is_empty() {
            let content = std::mem::take(&mut self.buffer);
            if self.inside_tag {
                out.push(Fragment::Reasoning(content));
            } else {
                out.push(Fragment::Text(content));
            }
        }
        out
    }

    fn scan(&mut self, at_end: bool) -> Vec<Fragment> {
        let mut out = Vec::new();
        loop {
            if self.buffer.is_empty() {
                break;
            }

            if self.closed {
                out.push(Fragment::Text(std::mem::take(&mut self.buffer)));
                break;
            }

            if self.inside_tag {
                let marker = self.active_tag.unwrap_or("think");
                let close = format!("</{marker}>");
                if let Some(idx) = find_ci(&self.buffer, &close) {
                    if idx > 0 {
                        out.push(Fragment::Reasoning(self.buffer[..idx].to_string()));
                    }
                    self.buffer.drain(..idx + close.len());
                    self.inside_tag = false;
                    self.active_tag = None;
                    self.closed = true;
                    trace!(marker, "reasoning block closed");
                    out.push(Fragment::ReasoningEnd);
                    continue;
                }
                let hold = if at_end {
                    0
                } else {
                    suffix_holdback(&self.buffer, &[close.as_str()])
                };
                let emit = self.buffer.len() - hold;
                if emit > 0 {
                    let rest = self.buffer.split_off(emit);
                    let content = std::mem::replace(&mut self.buffer, rest);
                    out.push(Fragment::Reasoning(content));
                }
                break;
            }

            match find_open(&self.buffer) {
                Some((idx, marker)) => {
                    if idx > 0 {
                        out.push(Fragment::Text(self.buffer[..idx].to_string()));
                    }
                    self.buffer.drain(..idx + marker.len() + 2);
                    self.inside_tag = true;
                    self.active_tag = Some(marker);
                    self.last_marker = Some(marker);
                    trace!(marker, "reasoning block opened");
                }
                None => {
                    let opens: Vec<String> =
                        MARKERS.iter().map(|m| format!("<{m}>")).collect();
                    let candidates: Vec<&str> = opens.iter().map(String::as_str).collect();
                    let hold = if at_end {
                        0
                    } else {
                        suffix_holdback(&self.buffer, &candidates)
                    };
                    let emit = self.buffer.len() - hold;
                    if emit > 0 {
                        let rest = self.buffer.split_off(emit);
                        let content = std::mem::replace(&mut self.buffer, rest);
                        out.push(Fragment::Text(content));
                    }
                    break;
                }
            }
        }
        out
    }
}

/// Case-insensitive substring search. Needles are ASCII, so lowercasing
/// the haystack preserves byte offsets.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(needle)
}

/// Earliest opening marker in the buffer.
fn find_open(buffer: &str) -> Option<(usize, &'static str)> {
    let lower = buffer.to_ascii_lowercase();
    let mut best: Option<(usize, &'static str)> = None;
    for marker in MARKERS {
        let tag = format!("<{marker}>");
        if let Some(idx) = lower.find(&tag) {
            match best {
                None => best = Some((idx, marker)),
                Some((best_idx, _)) if idx < best_idx => best = Some((idx, marker)),
                _ => {}
            }
        }
    }
    best
}

/// Length of the longest buffer suffix that is a case-insensitive proper
/// prefix of any candidate tag.
fn suffix_holdback(buffer: &str, candidates: &[&str]) -> usize {
    let lower = buffer.to_ascii_lowercase();
    let mut best = 0;
    for tag in candidates {
        for len in 1..tag.len() {
            if len <= lower.len() && lower.ends_with(&tag[..len]) {
                best = best.max(len);
            }
        }
    }
    best
}
