//! Banner fragment construction.
//!
//! # Responsibilities
//! - Render the environment message and color into the overlay markup
//! - Escape the message for safe inclusion as HTML text
//! - Keep the banner's CSS from bleeding into (or being overridden by) the
//!   host page
//!
//! # Design Decisions
//! - Built exactly once at startup; shared as immutable bytes afterwards
//! - Style isolation via a shadow root: the fragment ships a `<template>`
//!   plus a short script that attaches it to a host element
//! - The dismiss glyph removes the host element, taking the whole banner
//!   (shadow tree included) out of the page

use bytes::Bytes;

/// Immutable banner markup, shared read-only across all request handling.
#[derive(Debug, Clone)]
pub struct Banner {
    bytes: Bytes,
}

impl Banner {
    /// Build the banner fragment for `message` in `color`.
    ///
    /// The message is HTML-escaped before embedding. The color token is
    /// spliced verbatim into a CSS property value and is not validated; it
    /// comes from the operator's command line, not from request data.
    pub fn build(message: &str, color: &str) -> Self {
        let message = html_escape::encode_text(message);
        let markup = format!(
            r#"<template class="envbanner-template">
	<style>
	div {{
		background-color: {color};
		color: white;
		position: absolute;
		top: calc(-20px / sqrt(2));
		left: calc(-1 * (120px - 120px / sqrt(2)) - 20px / sqrt(2));
		z-index: 32767;
		transform: rotate(-45deg);
		width: 120px;
		text-align: center;
		line-height: 20px;
		font-size: 12px;
		transform-origin: top right;
	}}
	b {{
		opacity: 0.8;
	}}
	</style>
	<div>{message} <b>🞪</b></div>
</template>
<span class="envbanner-host"></span>
<script>
	const host = document.querySelector('.envbanner-host');
	const shadow = host.attachShadow({{ mode: 'open' }});
	const template = document.querySelector('.envbanner-template');
	shadow.appendChild(template.content);
	shadow.querySelector('b').addEventListener('click', () => host.remove());
</script>"#
        );
        Self {
            bytes: Bytes::from(markup),
        }
    }

    /// Raw fragment bytes. `Bytes` clones are reference-counted, so every
    /// response rewrite shares the same allocation.
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_escaped() {
        let banner = Banner::build("<Staging> & co", "red");
        let markup = String::from_utf8(banner.bytes().to_vec()).unwrap();

        assert!(markup.contains("&lt;Staging&gt; &amp; co"));
        assert!(!markup.contains("<Staging>"));
    }

    #[test]
    fn test_color_is_spliced_verbatim() {
        let banner = Banner::build("Production", "#ff8800");
        let markup = String::from_utf8(banner.bytes().to_vec()).unwrap();

        assert!(markup.contains("background-color: #ff8800;"));
    }

    #[test]
    fn test_fragment_is_style_isolated_and_dismissable() {
        let banner = Banner::build("Production", "red");
        let markup = String::from_utf8(banner.bytes().to_vec()).unwrap();

        assert!(markup.contains("attachShadow"));
        assert!(markup.contains("host.remove()"));
    }

    #[test]
    fn test_clones_share_the_same_bytes() {
        let banner = Banner::build("Production", "red");
        let a = banner.bytes();
        let b = banner.bytes();

        assert_eq!(a, b);
        assert!(!banner.is_empty());
        assert_eq!(banner.len(), a.len());
    }
}
