use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::geometry::{ContentSpan, PageGeometry};

/// Draws the measured regions of one page.
///
/// Rendering is presentation only; callers log failures and move on.
pub trait Visualizer: Sync {
    fn render(
        &self,
        page_number: usize,
        geometry: &PageGeometry,
        span: Option<&ContentSpan>,
    ) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVisualizer;

impl Visualizer for NoopVisualizer {
    fn render(&self, _: usize, _: &PageGeometry, _: Option<&ContentSpan>) -> Result<()> {
        Ok(())
    }
}

/// Writes `page_NNN.html` files holding an SVG drawing of the page.
///
/// The SVG y axis grows downward, so the smallest content coordinate is drawn
/// at the visual top of the page.
#[derive(Debug, Clone)]
pub struct HtmlOverlay {
    out_dir: PathBuf,
    document_name: String,
}

impl HtmlOverlay {
    pub fn new(out_dir: PathBuf, document: &Path) -> Self {
        let document_name = document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            out_dir,
            document_name,
        }
    }

    pub fn page_path(&self, page_number: usize) -> PathBuf {
        self.out_dir.join(format!("page_{page_number:03}.html"))
    }

    fn regions_svg(geometry: &PageGeometry, span: &ContentSpan) -> String {
        let width = geometry.width;
        let height = geometry.height;
        let top_region = (height - span.topmost).max(0.0);
        let bottom_region = span.bottommost.max(0.0);
        let content = span.height().max(0.0);

        format!(
            r#"<rect class='top-empty' x='0' y='{topmost}' width='{width}' height='{top_region}' />
<rect class='bottom-empty' x='0' y='0' width='{width}' height='{bottom_region}' />
<rect class='content' x='0' y='{topmost}' width='{width}' height='{content}' />"#,
            topmost = span.topmost,
        )
    }
}

impl Visualizer for HtmlOverlay {
    fn render(
        &self,
        page_number: usize,
        geometry: &PageGeometry,
        span: Option<&ContentSpan>,
    ) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;

        let regions = span
            .map(|span| HtmlOverlay::regions_svg(geometry, span))
            .unwrap_or_default();
        let caption = match span {
            Some(span) => format!(
                "content from y={:.2} to y={:.2} on a {:.2} x {:.2} page",
                span.topmost, span.bottommost, geometry.width, geometry.height
            ),
            None => "No content found.".to_string(),
        };

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset='utf-8'>
<title>{document} - Page {page_number} - Empty Space Visualization</title>
<style>
body {{ margin: 20px; font-family: Arial, sans-serif; }}
svg {{ height: 80vh; max-width: 100%; }}
.page {{ fill: none; stroke: black; stroke-width: 1; }}
.top-empty {{ fill: yellow; fill-opacity: 0.3; stroke: none; }}
.bottom-empty {{ fill: cyan; fill-opacity: 0.3; stroke: none; }}
.content {{ fill: none; stroke: red; stroke-width: 2; }}
#legend {{ margin-top: 10px; font-size: 12px; }}
.legend-item {{ display: inline-block; margin-right: 15px; }}
.legend-box {{ display: inline-block; width: 20px; height: 15px; vertical-align: middle; margin-right: 5px; }}
</style>
</head>
<body>
<h3>Page {page_number} - Empty Space Visualization</h3>
<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 {width} {height}' preserveAspectRatio='xMidYMid meet'>
<rect class='page' x='0' y='0' width='{width}' height='{height}' />
{regions}
</svg>
<div id='legend'>
<span class='legend-item'><span class='legend-box' style='background: rgba(255,255,0,0.3);'></span>Top Empty Space</span>
<span class='legend-item'><span class='legend-box' style='background: rgba(0,255,255,0.3);'></span>Bottom Empty Space</span>
<span class='legend-item'><span class='legend-box' style='border: 2px solid red; box-sizing: border-box;'></span>Content Area</span>
</div>
<p>{caption}</p>
</body>
</html>"#,
            document = html_escape::encode_text(&self.document_name),
            width = geometry.width,
            height = geometry.height,
        );

        fs::write(self.page_path(page_number), html)?;
        Ok(())
    }
}
