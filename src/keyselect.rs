//! Minimal-keystroke interactive link selection.
//!
//! Each link on a page gets a short uppercase letter code; the host
//! feeds typed tokens into [`KeySelector::feed`] until one candidate
//! survives. This replaces a blocking read loop with an explicit state
//! machine the host's input loop drives.

use crate::error::LinkError;
use crate::regions::Region;
use crate::types::Action;

const ALPHABET_LEN: usize = 26;

/// Minimum overlay label point size
const MIN_POINT_SIZE: u32 = 6;
/// Render-width divisor for the overlay label point size
const POINT_SIZE_DIVISOR: u32 = 50;

/// Generate `n` distinct letter codes of uniform length
/// `ceil(log_26(n))` via repeated base-26 digit extraction.
#[must_use]
pub fn make_codes(n: usize) -> Vec<String> {
    let len = code_len(n);
    (0..n)
        .map(|index| {
            let mut code = Vec::with_capacity(len);
            let mut i = index;
            for _ in 0..len {
                code.push(b'A' + (i % ALPHABET_LEN) as u8);
                i /= ALPHABET_LEN;
            }
            code.reverse();
            String::from_utf8(code).unwrap_or_default()
        })
        .collect()
}

fn code_len(n: usize) -> usize {
    let mut len = 1;
    let mut capacity = ALPHABET_LEN;
    while capacity < n {
        capacity *= ALPHABET_LEN;
        len += 1;
    }
    len
}

/// One token of user input during selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectToken {
    /// A code letter, matched case-insensitively
    Letter(char),
    /// Scroll the displayed page without consuming a selection step
    Scroll,
    /// Generic abort input
    Abort,
}

/// Outcome of feeding one token
#[derive(Clone, Debug, PartialEq)]
pub enum Feed {
    /// Candidates narrowed; this many remain
    Continue { remaining: usize },
    /// Exactly one candidate survived
    Done(Action),
    /// Token did not match any candidate; state unchanged
    NoOp,
    /// Host should scroll the page (wrapping to top at the bottom)
    Scroll,
    /// User aborted. A cancellation, not an error.
    Cancelled,
}

/// A code label to draw near a link's projected position
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLabel {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub point_size: u32,
}

#[derive(Debug)]
struct Candidate {
    /// Code letters not yet consumed by typed input
    remaining: String,
    action: Action,
}

/// Incremental-narrowing selection over one page's link regions
#[derive(Debug)]
pub struct KeySelector {
    candidates: Vec<Candidate>,
    labels: Vec<OverlayLabel>,
}

impl KeySelector {
    /// Start a selection over a page's projected regions.
    ///
    /// `displayed` is the page the viewer currently shows; selecting on
    /// any other page fails with `PageNotReady`. An empty region list
    /// fails with `NoLinksOnPage`.
    pub fn new(
        page: usize,
        regions: &[Region],
        displayed: Option<usize>,
        render_width: u32,
    ) -> Result<Self, LinkError> {
        if displayed != Some(page) {
            return Err(LinkError::PageNotReady { page });
        }
        if regions.is_empty() {
            return Err(LinkError::NoLinksOnPage { page });
        }

        let codes = make_codes(regions.len());
        let point_size = (render_width / POINT_SIZE_DIVISOR).max(MIN_POINT_SIZE);

        let labels = regions
            .iter()
            .zip(&codes)
            .map(|(region, code)| OverlayLabel {
                text: code.clone(),
                x: region.rect.x0,
                y: region.rect.y0,
                point_size,
            })
            .collect();

        let candidates = regions
            .iter()
            .zip(codes)
            .map(|(region, code)| Candidate {
                remaining: code,
                action: region.action.clone(),
            })
            .collect();

        Ok(Self { candidates, labels })
    }

    /// Labels for the host to draw over the page image
    #[must_use]
    pub fn overlay_labels(&self) -> &[OverlayLabel] {
        &self.labels
    }

    /// Whether a single candidate already remains (true for a one-link
    /// page before any input; the host should not read a token)
    #[must_use]
    pub fn resolved(&self) -> Option<&Action> {
        match self.candidates.as_slice() {
            [single] => Some(&single.action),
            _ => None,
        }
    }

    /// Feed one input token, narrowing the candidate set
    pub fn feed(&mut self, token: SelectToken) -> Feed {
        if let Some(action) = self.resolved() {
            return Feed::Done(action.clone());
        }

        let letter = match token {
            SelectToken::Abort => return Feed::Cancelled,
            SelectToken::Scroll => return Feed::Scroll,
            SelectToken::Letter(c) => c.to_ascii_uppercase(),
        };

        let survivors: Vec<usize> = self
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.remaining.starts_with(letter))
            .map(|(i, _)| i)
            .collect();

        if survivors.is_empty() {
            return Feed::NoOp;
        }

        let mut kept = Vec::with_capacity(survivors.len());
        for (i, mut candidate) in std::mem::take(&mut self.candidates).into_iter().enumerate() {
            if survivors.contains(&i) {
                candidate.remaining.remove(0);
                kept.push(candidate);
            }
        }
        self.candidates = kept;

        match self.candidates.as_slice() {
            [single] => Feed::Done(single.action.clone()),
            rest => Feed::Continue {
                remaining: rest.len(),
            },
        }
    }
}
