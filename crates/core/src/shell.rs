//! Page shell shared by the admin and storefront templates.
//!
//! Both web crates render `templates/shell.html` around their page content.
//! The shell draws a fixed header (brand link, search link, cart badge) and
//! a footer; this module holds the values that template reads.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Highest count the cart badge renders literally.
pub const CART_BADGE_MAX: u32 = 9;

/// Content width of the page body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    #[default]
    Default,
    FullWidth,
    Centered,
}

impl Layout {
    /// CSS class applied to the content wrapper.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Default => "layout-default",
            Self::FullWidth => "layout-full-width",
            Self::Centered => "layout-centered",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_class())
    }
}

/// Source of the cart item count shown in the header badge.
pub trait CartCount {
    /// Total number of items currently in the cart.
    fn total_items(&self) -> u32;
}

impl CartCount for u32 {
    fn total_items(&self) -> u32 {
        *self
    }
}

/// Header/footer frame values for one rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shell {
    /// Document title; the brand name alone when empty.
    pub page_title: Option<String>,
    pub show_cart: bool,
    pub cart_items: u32,
    pub layout: Layout,
    pub class_name: String,
    pub header_class: String,
    pub footer_class: String,
}

impl Default for Shell {
    fn default() -> Self {
        Self {
            page_title: None,
            show_cart: true,
            cart_items: 0,
            layout: Layout::Default,
            class_name: String::new(),
            header_class: String::new(),
            footer_class: String::new(),
        }
    }
}

impl Shell {
    /// A shell titled `page_title` with default settings.
    #[must_use]
    pub fn titled(page_title: impl Into<String>) -> Self {
        Self {
            page_title: Some(page_title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cart(mut self, cart: &impl CartCount) -> Self {
        self.cart_items = cart.total_items();
        self
    }

    #[must_use]
    pub const fn without_cart(mut self) -> Self {
        self.show_cart = false;
        self
    }

    #[must_use]
    pub const fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_classes(
        mut self,
        class_name: impl Into<String>,
        header_class: impl Into<String>,
        footer_class: impl Into<String>,
    ) -> Self {
        self.class_name = class_name.into();
        self.header_class = header_class.into();
        self.footer_class = footer_class.into();
        self
    }

    /// Full `<title>` text: "Page | Brand", or the brand alone.
    #[must_use]
    pub fn document_title(&self, brand: &str) -> String {
        match self.page_title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => format!("{title} | {brand}"),
            _ => brand.to_string(),
        }
    }

    /// Badge text, or `None` when the badge is hidden.
    ///
    /// Hidden when the cart is disabled or empty; counts above nine render
    /// as "9+".
    #[must_use]
    pub fn cart_badge(&self) -> Option<String> {
        if !self.show_cart || self.cart_items == 0 {
            None
        } else if self.cart_items > CART_BADGE_MAX {
            Some(format!("{CART_BADGE_MAX}+"))
        } else {
            Some(self.cart_items.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let shell = Shell::default();
        assert!(shell.show_cart);
        assert_eq!(shell.layout, Layout::Default);
        assert_eq!(shell.document_title("Funda"), "Funda");
    }

    #[test]
    fn test_cart_badge() {
        assert_eq!(Shell::default().cart_badge(), None);
        assert_eq!(Shell::default().with_cart(&3).cart_badge().as_deref(), Some("3"));
        assert_eq!(Shell::default().with_cart(&9).cart_badge().as_deref(), Some("9"));
        assert_eq!(Shell::default().with_cart(&10).cart_badge().as_deref(), Some("9+"));
        assert_eq!(Shell::default().with_cart(&4).without_cart().cart_badge(), None);
    }

    #[test]
    fn test_document_title() {
        assert_eq!(Shell::titled("Fundas").document_title("Funda"), "Fundas | Funda");
        assert_eq!(Shell::titled("  ").document_title("Funda"), "Funda");
    }

    #[test]
    fn test_layout_class() {
        assert_eq!(Layout::FullWidth.css_class(), "layout-full-width");
        assert_eq!(Layout::Centered.to_string(), "layout-centered");
    }
}
