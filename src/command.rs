//! Argument templating for the external annotation tool.
//!
//! The pipeline never implements image annotation itself; it drives an
//! external command (ImageMagick-style) built from a placeholder
//! template. Placeholders:
//!
//! - `%i` input page-image file
//! - `%o` output (scratch) file
//! - `%f` foreground color
//! - `%b` background color
//! - `%r` one `x0,y0,x1,y1` word per region rectangle (the "apply" list)
//! - `%t` one word per overlay label text
//! - `%s` scaled label point size
//!
//! Words without a recognized placeholder pass through verbatim.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::keyselect::OverlayLabel;
use crate::types::PixelRect;

/// An argv template for the annotation command
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertTemplate(pub Vec<String>);

/// Values substituted into a template
#[derive(Debug, Default)]
pub struct ExpandCtx<'a> {
    pub input: Option<&'a Path>,
    pub output: Option<&'a Path>,
    pub foreground: &'a str,
    pub background: &'a str,
    pub rects: &'a [PixelRect],
    pub labels: &'a [OverlayLabel],
    pub point_size: u32,
}

impl ConvertTemplate {
    /// Expand the template into final command arguments
    #[must_use]
    pub fn expand(&self, ctx: &ExpandCtx<'_>) -> Vec<String> {
        let mut args = Vec::with_capacity(self.0.len());

        for word in &self.0 {
            match word.as_str() {
                "%i" => {
                    if let Some(input) = ctx.input {
                        args.push(input.to_string_lossy().into_owned());
                    }
                }
                "%o" => {
                    if let Some(output) = ctx.output {
                        args.push(output.to_string_lossy().into_owned());
                    }
                }
                "%f" => args.push(ctx.foreground.to_string()),
                "%b" => args.push(ctx.background.to_string()),
                "%s" => args.push(ctx.point_size.to_string()),
                "%r" => {
                    for rect in ctx.rects {
                        args.push(format!(
                            "{},{},{},{}",
                            rect.x0, rect.y0, rect.x1, rect.y1
                        ));
                    }
                }
                "%t" => {
                    for label in ctx.labels {
                        args.push(label.text.clone());
                    }
                }
                _ => args.push(word.clone()),
            }
        }

        args
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn expands_single_placeholders() {
        let template = ConvertTemplate(vec![
            "-fill".into(),
            "%f".into(),
            "-background".into(),
            "%b".into(),
            "%i".into(),
            "%o".into(),
        ]);
        let input = PathBuf::from("/tmp/page-1.png");
        let output = PathBuf::from("/tmp/scratch.png");
        let args = template.expand(&ExpandCtx {
            input: Some(&input),
            output: Some(&output),
            foreground: "red",
            background: "white",
            ..Default::default()
        });

        assert_eq!(
            args,
            vec![
                "-fill",
                "red",
                "-background",
                "white",
                "/tmp/page-1.png",
                "/tmp/scratch.png",
            ]
        );
    }

    #[test]
    fn rect_placeholder_repeats_per_region() {
        let template = ConvertTemplate(vec!["-draw".into(), "%r".into(), "-flatten".into()]);
        let rects = [PixelRect::new(1, 2, 3, 4), PixelRect::new(10, 20, 30, 40)];
        let args = template.expand(&ExpandCtx {
            rects: &rects,
            ..Default::default()
        });

        assert_eq!(args, vec!["-draw", "1,2,3,4", "10,20,30,40", "-flatten"]);
    }

    #[test]
    fn label_placeholders_expand_text_and_size() {
        let template = ConvertTemplate(vec!["-pointsize".into(), "%s".into(), "%t".into()]);
        let labels = [
            OverlayLabel {
                text: "AB".into(),
                x: 0,
                y: 0,
                point_size: 12,
            },
            OverlayLabel {
                text: "AC".into(),
                x: 0,
                y: 30,
                point_size: 12,
            },
        ];
        let args = template.expand(&ExpandCtx {
            labels: &labels,
            point_size: 12,
            ..Default::default()
        });

        assert_eq!(args, vec!["-pointsize", "12", "AB", "AC"]);
    }

    #[test]
    fn unknown_words_pass_through() {
        let template = ConvertTemplate(vec!["%z".into(), "literal".into()]);
        let args = template.expand(&ExpandCtx::default());
        assert_eq!(args, vec!["%z", "literal"]);
    }
}
