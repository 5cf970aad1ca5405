use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use log::{debug, warn};
use rayon::prelude::*;

use crate::core::geometry::PageGeometry;
use crate::core::model::{DocumentReport, EmptySpaceResult, PageOutcome};
use crate::core::{analyze, collect};
use crate::export::{
    Exporter, HtmlOverlay, JsonExporter, NoopVisualizer, TextExporter, Visualizer,
};
use crate::parser::word_extractor::WordExtractor;
use crate::parser::{DocumentSource, PopplerSource};

/// Environment variable overriding the `pdftotext` binary.
pub const PDFTOTEXT_ENV: &str = "PDFTOTEXT";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub pages: PageSelection,
    pub visualize: bool,
    pub json: bool,
    pub parallel: bool,
    pub pdftotext: PathBuf,
}

impl PipelineConfig {
    pub fn new(input: PathBuf, output: PathBuf) -> Self {
        let pdftotext = std::env::var_os(PDFTOTEXT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("pdftotext"));
        Self {
            input,
            output,
            pages: PageSelection::All,
            visualize: false,
            json: false,
            parallel: true,
            pdftotext,
        }
    }

    pub fn overlay_dir(&self) -> PathBuf {
        self.output.join("overlay")
    }
}

/// Which 1-based pages to analyze, parsed from specs like `1,3-5`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageSelection {
    #[default]
    All,
    Ranges(Vec<RangeInclusive<usize>>),
}

impl PageSelection {
    /// Selected pages that exist in a document of `page_count` pages, ascending.
    pub fn resolve(&self, page_count: usize) -> Vec<usize> {
        match self {
            PageSelection::All => (1..=page_count).collect(),
            PageSelection::Ranges(ranges) => {
                let mut pages = Vec::new();
                for range in ranges {
                    let (start, end) = (*range.start(), *range.end());
                    if end > page_count {
                        let first_missing = start.max(page_count + 1);
                        warn!(
                            "ignoring pages {first_missing}-{end} beyond the last page {page_count}"
                        );
                    }
                    pages.extend(start..=end.min(page_count));
                }
                pages.sort_unstable();
                pages.dedup();
                pages
            }
        }
    }
}

impl FromStr for PageSelection {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let mut ranges = Vec::new();
        for part in text.split(',') {
            let part = part.trim();
            let (start, end) = match part.split_once('-') {
                Some((start, end)) => (parse_page(start)?, parse_page(end)?),
                None => {
                    let page = parse_page(part)?;
                    (page, page)
                }
            };
            if start > end {
                anyhow::bail!("page range {part} runs backwards");
            }
            ranges.push(start..=end);
        }
        Ok(PageSelection::Ranges(ranges))
    }
}

fn parse_page(text: &str) -> Result<usize> {
    let page: usize = text
        .trim()
        .parse()
        .with_context(|| format!("not a page number: '{}'", text.trim()))?;
    if page == 0 {
        anyhow::bail!("page numbers start at 1");
    }
    Ok(page)
}

/// Loads, measures and scores one page.
pub fn analyze_page<S>(source: &S, page_number: usize) -> Result<(PageGeometry, EmptySpaceResult)>
where
    S: DocumentSource + ?Sized,
{
    let content = source.load_page(page_number)?;
    let span = collect(&content.items);
    let result = analyze(page_number, &content.geometry, span)?;
    debug!(
        "page {page_number}: {} item(s), span {:?}",
        content.items.len(),
        result.content_span
    );
    Ok((content.geometry, result))
}

/// Analyzes `pages`, turning per-page failures into [`PageOutcome::Failed`].
/// Outcomes come back in the order of `pages`.
pub fn analyze_pages<S>(source: &S, pages: &[usize], parallel: bool) -> Vec<PageOutcome>
where
    S: DocumentSource + ?Sized,
{
    let outcome = |&page_number: &usize| match analyze_page(source, page_number) {
        Ok((geometry, result)) => PageOutcome::Analyzed { geometry, result },
        Err(err) => {
            warn!("page {page_number}: {err:#}");
            PageOutcome::Failed {
                page_number,
                reason: format!("{err:#}"),
            }
        }
    };

    if parallel {
        pages.par_iter().map(outcome).collect()
    } else {
        pages.iter().map(outcome).collect()
    }
}

/// Hands every analyzed page to `visualizer`. Failures are logged only.
pub fn visualize_report<V>(report: &DocumentReport, visualizer: &V)
where
    V: Visualizer + ?Sized,
{
    for page in &report.pages {
        if let PageOutcome::Analyzed { geometry, result } = page {
            if let Err(err) =
                visualizer.render(result.page_number, geometry, result.content_span.as_ref())
            {
                warn!("page {}: overlay not written: {err:#}", result.page_number);
            }
        }
    }
}

pub fn analyze_source<S>(source: &S, input: &Path, config: &PipelineConfig) -> DocumentReport
where
    S: DocumentSource + ?Sized,
{
    let pages = config.pages.resolve(source.page_count());
    DocumentReport {
        source: input.to_path_buf(),
        pages: analyze_pages(source, &pages, config.parallel),
    }
}

pub fn build_report(config: &PipelineConfig) -> Result<DocumentReport> {
    let extractor = WordExtractor::new(config.pdftotext.clone());
    let source = PopplerSource::open(&config.input, &extractor)?;
    Ok(analyze_source(&source, &config.input, config))
}

pub fn export_report(report: &DocumentReport, config: &PipelineConfig) -> Result<()> {
    TextExporter::new(config.output.clone()).export(report)?;

    if config.json {
        JsonExporter::new(config.output.clone()).export(report)?;
    }

    let visualizer: Box<dyn Visualizer> = if config.visualize {
        Box::new(HtmlOverlay::new(config.overlay_dir(), &config.input))
    } else {
        Box::new(NoopVisualizer)
    };
    visualize_report(report, visualizer.as_ref());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};

    use pretty_assertions::assert_eq;

    use crate::core::geometry::{ContentSpan, PositionedItem};
    use crate::core::model::PageContent;

    fn temp_output_dir(prefix: &str) -> PathBuf {
        let mut out = std::env::temp_dir();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis();
        let pid = std::process::id();
        out.push(format!("{prefix}-{pid}-{now}"));
        out
    }

    struct FakeSource {
        pages: Vec<Option<PageContent>>,
    }

    impl DocumentSource for FakeSource {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn load_page(&self, page_number: usize) -> Result<PageContent> {
            self.pages
                .get(page_number - 1)
                .cloned()
                .flatten()
                .ok_or_else(|| anyhow::anyhow!("cannot read page {page_number}"))
        }
    }

    fn page(page_number: usize, height: f64, items: Vec<PositionedItem>) -> Option<PageContent> {
        Some(PageContent {
            page_number,
            geometry: PageGeometry::new(600.0, height),
            items,
        })
    }

    fn fake_document() -> FakeSource {
        FakeSource {
            pages: vec![
                page(
                    1,
                    800.0,
                    vec![PositionedItem::text(100.0, 120.0), PositionedItem::image(300.0, 700.0)],
                ),
                page(2, 800.0, vec![]),
                None,
                page(4, 0.0, vec![PositionedItem::text(1.0, 2.0)]),
            ],
        }
    }

    #[derive(Default)]
    struct RecordingVisualizer {
        calls: Mutex<HashMap<usize, Option<ContentSpan>>>,
    }

    impl Visualizer for RecordingVisualizer {
        fn render(
            &self,
            page_number: usize,
            _geometry: &PageGeometry,
            span: Option<&ContentSpan>,
        ) -> Result<()> {
            self.calls.lock().unwrap().insert(page_number, span.copied());
            if page_number == 2 {
                anyhow::bail!("renderer unavailable");
            }
            Ok(())
        }
    }

    #[test]
    fn parses_page_selection() {
        assert_eq!("".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!("all".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!(
            "1, 3-5".parse::<PageSelection>().unwrap(),
            PageSelection::Ranges(vec![1..=1, 3..=5])
        );
        assert!("0".parse::<PageSelection>().is_err());
        assert!("5-3".parse::<PageSelection>().is_err());
        assert!("two".parse::<PageSelection>().is_err());
    }

    #[test]
    fn resolves_selection_against_page_count() {
        let selection: PageSelection = "4,2,2-3,9".parse().unwrap();
        assert_eq!(selection.resolve(5), vec![2, 3, 4]);
        assert_eq!(PageSelection::All.resolve(3), vec![1, 2, 3]);
    }

    #[test]
    fn huge_range_is_clamped_to_page_count() {
        let selection: PageSelection = "1-4000000000".parse().unwrap();
        assert_eq!(selection.resolve(3), vec![1, 2, 3]);

        let beyond: PageSelection = "10-4000000000".parse().unwrap();
        assert_eq!(beyond.resolve(3), Vec::<usize>::new());
        assert_eq!(selection.resolve(0), Vec::<usize>::new());
    }

    #[test]
    fn failing_pages_do_not_stop_the_others() {
        let source = fake_document();
        let outcomes = analyze_pages(&source, &[1, 2, 3, 4], false);

        assert_eq!(
            outcomes.iter().map(PageOutcome::page_number).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );

        let first = outcomes[0].result().unwrap();
        assert_eq!(first.content_span, Some(ContentSpan::new(100.0, 700.0)));
        assert_eq!((first.top_percent, first.bottom_percent), (87.5, 87.5));

        let second = outcomes[1].result().unwrap();
        assert!(second.is_empty_page());

        match &outcomes[2] {
            PageOutcome::Failed { reason, .. } => assert!(reason.contains("cannot read page 3")),
            other => panic!("expected failure, got {other:?}"),
        }
        match &outcomes[3] {
            PageOutcome::Failed { reason, .. } => assert!(reason.contains("height")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn parallel_and_sequential_runs_agree() {
        let source = fake_document();
        let pages = [4, 1, 2, 3];
        let sequential = serde_json::to_string(&analyze_pages(&source, &pages, false)).unwrap();
        let parallel = serde_json::to_string(&analyze_pages(&source, &pages, true)).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn overlay_failures_are_swallowed() {
        let source = fake_document();
        let config = PipelineConfig::new(PathBuf::from("fake.pdf"), PathBuf::from("out"));
        let report = analyze_source(&source, &config.input, &config);

        let visualizer = RecordingVisualizer::default();
        visualize_report(&report, &visualizer);

        let calls = visualizer.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[&1], Some(ContentSpan::new(100.0, 700.0)));
        assert_eq!(calls[&2], None);
    }

    #[test]
    fn export_report_writes_selected_outputs() -> Result<()> {
        let output = temp_output_dir("emptyspace-pipeline");
        let source = fake_document();
        let mut config = PipelineConfig::new(PathBuf::from("fake.pdf"), output.clone());
        config.json = true;
        config.visualize = true;
        config.pages = "1-2".parse()?;

        let report = analyze_source(&source, &config.input, &config);
        export_report(&report, &config)?;

        let text = fs::read_to_string(output.join("report.txt"))?;
        assert!(text.starts_with("Page 1:\n"));
        assert!(text.contains("Page 2: No content found."));
        assert!(output.join("report.json").exists());
        assert!(output.join("overlay/page_001.html").exists());
        assert!(output.join("overlay/page_002.html").exists());

        let _ = fs::remove_dir_all(&output);
        Ok(())
    }

    #[test]
    fn export_without_visualize_writes_no_overlay() -> Result<()> {
        let output = temp_output_dir("emptyspace-pipeline-plain");
        let source = fake_document();
        let config = PipelineConfig::new(PathBuf::from("fake.pdf"), output.clone());

        let report = analyze_source(&source, &config.input, &config);
        export_report(&report, &config)?;

        assert!(output.join("report.txt").exists());
        assert!(!output.join("report.json").exists());
        assert!(!config.overlay_dir().exists());

        let _ = fs::remove_dir_all(&output);
        Ok(())
    }
}
