//! Viewport and layout geometry.
//!
//! The page has no layout engine. Callers place elements with [`LayoutBox`]es in
//! document coordinates, and the viewport scrolls vertically over them.

use super::*;

/// Axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Edge-inclusive intersection, so zero-area and edge-adjacent boxes still
    /// produce a (degenerate) rect the way `IntersectionObserver` reports them.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right >= x && bottom >= y {
            Some(Rect {
                x,
                y,
                width: right - x,
                height: bottom - y,
            })
        } else {
            None
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Element box in document coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutBox {
    pub top: i64,
    pub height: i64,
}

impl LayoutBox {
    pub fn new(top: i64, height: i64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> i64 {
        self.top.saturating_add(self.height)
    }

    pub(crate) fn to_rect(self, viewport_width: i64) -> Rect {
        Rect::new(0.0, self.top as f64, viewport_width as f64, self.height as f64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollBehavior {
    #[default]
    Instant,
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: i64,
    pub height: i64,
    pub scroll_y: i64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            scroll_y: 0,
        }
    }
}

impl Viewport {
    /// Visible area in document coordinates.
    pub fn rect(&self) -> Rect {
        Rect::new(
            0.0,
            self.scroll_y as f64,
            self.width as f64,
            self.height as f64,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Margin {
    Px(f64),
    Percent(f64),
}

impl Margin {
    fn resolve(self, basis: f64) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::Percent(percent) => basis * percent / 100.0,
        }
    }
}

/// `rootMargin` of an intersection observer. Positive values grow the root box,
/// negative values shrink it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: Margin,
    pub right: Margin,
    pub bottom: Margin,
    pub left: Margin,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self {
            top: Margin::Px(0.0),
            right: Margin::Px(0.0),
            bottom: Margin::Px(0.0),
            left: Margin::Px(0.0),
        }
    }
}

impl RootMargin {
    /// Parses CSS margin shorthand with one to four `px` or `%` values.
    pub fn parse(src: &str) -> Result<Self> {
        let values = src
            .split_whitespace()
            .map(|token| parse_margin_token(token, src))
            .collect::<Result<Vec<_>>>()?;
        let (top, right, bottom, left) = match values.as_slice() {
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            _ => {
                return Err(Error::InvalidConfig(format!(
                    "root margin needs one to four values: {src:?}"
                )));
            }
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    /// Root box after applying the margin; percentages resolve against the root's
    /// own width (left/right) and height (top/bottom).
    pub fn apply(&self, root: Rect) -> Rect {
        let top = self.top.resolve(root.height);
        let bottom = self.bottom.resolve(root.height);
        let left = self.left.resolve(root.width);
        let right = self.right.resolve(root.width);
        Rect::new(
            root.x - left,
            root.y - top,
            (root.width + left + right).max(0.0),
            (root.height + top + bottom).max(0.0),
        )
    }
}

fn parse_margin_token(token: &str, src: &str) -> Result<Margin> {
    let invalid = || Error::InvalidConfig(format!("invalid root margin: {src:?}"));
    if let Some(number) = token.strip_suffix('%') {
        return number
            .parse::<f64>()
            .map(Margin::Percent)
            .map_err(|_| invalid());
    }
    let number = token.strip_suffix("px").unwrap_or(token);
    let px = number.parse::<f64>().map_err(|_| invalid())?;
    // Unitless values other than zero are not valid CSS lengths.
    if number.len() == token.len() && px != 0.0 {
        return Err(invalid());
    }
    Ok(Margin::Px(px))
}
