//! `.. youtube:: VIDEO_ID` embeds a video player.

use super::{ArgumentSpec, Directive, DirectiveContext, DirectiveError, DirectiveInvocation, Plugin, choice, nonnegative_int};
use crate::Result;
use crate::rst::Block;
use crate::rst::html::escape;

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 390;
const EMBED_URL: &str = "https://www.youtube.com/embed/";

pub struct YoutubeDirective;

impl Plugin for YoutubeDirective {
    fn name(&self) -> &str {
        "youtube"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

impl Directive for YoutubeDirective {
    fn names(&self) -> &[&'static str] {
        &["youtube"]
    }

    fn arguments(&self) -> ArgumentSpec {
        ArgumentSpec {
            required: 1,
            optional: 0,
            final_whitespace: false,
        }
    }

    fn option_names(&self) -> &[&'static str] {
        &["width", "height", "align"]
    }

    fn run(
        &self,
        invocation: &DirectiveInvocation,
        _context: &mut dyn DirectiveContext,
    ) -> std::result::Result<Vec<Block>, DirectiveError> {
        let video_id = invocation.arguments.first().map(String::as_str).unwrap_or_default();
        let width = nonnegative_int(invocation, "width")?.unwrap_or(DEFAULT_WIDTH);
        let height = nonnegative_int(invocation, "height")?.unwrap_or(DEFAULT_HEIGHT);
        let align = choice(invocation, "align", &["left", "center", "right"])?
            .map(str::to_lowercase)
            .unwrap_or_else(|| "left".to_string());

        Ok(vec![Block::Raw(format!(
            "<div class=\"youtube align-{align}\"><iframe width=\"{width}\" height=\"{height}\" \
             src=\"{EMBED_URL}{id}\" frameborder=\"0\" allowfullscreen></iframe></div>",
            id = escape(video_id),
        ))])
    }
}
