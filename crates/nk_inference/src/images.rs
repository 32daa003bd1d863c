//! Image URLs for generated content.
//!
//! Images come from a keyword image service rather than a generative model,
//! which keeps them instant and free.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use nk_core::GalleryImage;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

const IMAGE_SERVICE: &str = "https://source.unsplash.com";
const PLACEHOLDER_FILL: &str = "#222222";

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, the set browsers
/// leave alone when encoding a URI component.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const GALLERY_PROMPTS: [&str; 8] = [
    "a photorealistic image of a futuristic city in South Africa",
    "an oil painting of a lion in a flower field",
    "a vibrant abstract image representing technology",
    "a serene landscape of the drakensberg mountains at sunrise",
    "a minimalist photo of a protea flower",
    "a steampunk-inspired robot reading a newspaper",
    "a watercolor painting of a cape town street scene",
    "a fantasy illustration of a mythical creature in the karoo desert",
];

fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// An 800x600 image matching `prompt`.
pub fn generate_image(prompt: &str) -> String {
    format!("{}/800x600/?{}", IMAGE_SERVICE, encode_component(prompt))
}

/// The fixed showcase gallery. Each image is looked up by the prompt's
/// subject, i.e. the prompt without its first four words.
pub fn generate_image_gallery() -> Vec<GalleryImage> {
    GALLERY_PROMPTS
        .iter()
        .map(|prompt| {
            let subject = prompt.split(' ').skip(4).collect::<Vec<_>>().join(" ");
            GalleryImage {
                image_url: format!("{}/800x450/?{}", IMAGE_SERVICE, encode_component(&subject)),
                prompt: prompt.to_string(),
            }
        })
        .collect()
}

/// Solid dark SVG used when an article image fails to load.
///
/// `dimensions` is `"<width>x<height>"`; missing parts render as empty
/// attributes, as browsers then fall back to the element size.
pub fn placeholder_data_url(dimensions: &str) -> String {
    let mut parts = dimensions.splitn(2, 'x');
    let width = parts.next().unwrap_or_default();
    let height = parts.next().unwrap_or_default();
    let svg = format!(
        r#"<svg width="{}" height="{}" xmlns="http://www.w3.org/2000/svg"><rect width="100%" height="100%" fill="{}"/></svg>"#,
        width, height, PLACEHOLDER_FILL
    );
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_image_encodes_prompt() {
        assert_eq!(
            generate_image("cape town & sea"),
            "https://source.unsplash.com/800x600/?cape%20town%20%26%20sea"
        );
    }

    #[test]
    fn test_encoding_keeps_component_marks() {
        assert_eq!(
            generate_image("rock 'n' roll (live)! ~*"),
            "https://source.unsplash.com/800x600/?rock%20'n'%20roll%20(live)!%20~*"
        );
        assert_eq!(
            generate_image("café/a+b?c=d"),
            "https://source.unsplash.com/800x600/?caf%C3%A9%2Fa%2Bb%3Fc%3Dd"
        );
    }

    #[test]
    fn test_gallery() {
        let gallery = generate_image_gallery();
        assert_eq!(gallery.len(), 8);
        assert_eq!(gallery[1].prompt, "an oil painting of a lion in a flower field");
        assert_eq!(
            gallery[1].image_url,
            "https://source.unsplash.com/800x450/?a%20lion%20in%20a%20flower%20field"
        );
    }

    #[test]
    fn test_placeholder_data_url() {
        let url = placeholder_data_url("1200x800");
        let encoded = url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let svg = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert!(svg.contains(r#"width="1200""#));
        assert!(svg.contains(r#"height="800""#));
        assert!(svg.contains("#222222"));
    }
}
