//! Background pipeline that burns link outlines onto rendered page images.
//!
//! Annotation is delegated to an external command (one process at a
//! time, strict FIFO over the document's page images) and resumed
//! cooperatively: the host calls [`DecorationPipeline::poll`] from its
//! event loop, so nothing here blocks. Failures on individual pages are
//! logged and skipped; the queue always runs to completion.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::cache::LinkCache;
use crate::command::{ConvertTemplate, ExpandCtx};
use crate::host::{LinkProvider, PageRenderer};
use crate::types::PixelRect;

/// Zero-length marker written next to the page images once decoration
/// finished. Its presence is the sole completion check; deleting it
/// forces re-decoration on the next schedule.
pub const DECORATION_MARKER: &str = ".decorated";

const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Configuration for the decoration pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    /// Whether decoration is desired at all
    pub enabled: bool,
    /// Outline color
    pub foreground: String,
    /// Fill/background color
    pub background: String,
    /// Annotation program, e.g. `convert`
    pub program: String,
    /// Argument template; see [`crate::command`] for placeholders
    pub args: ConvertTemplate,
    /// Fixed delay before re-checking a renderer that has not finished
    /// producing page images
    pub retry_delay_ms: u64,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            foreground: "red".into(),
            background: "none".into(),
            program: "convert".into(),
            args: ConvertTemplate(vec![
                "%i".into(),
                "-stroke".into(),
                "%f".into(),
                "-fill".into(),
                "%b".into(),
                "-draw".into(),
                "%r".into(),
                "%o".into(),
            ]),
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

/// Pipeline lifecycle: `Idle -> Scheduled -> Converting -> Done`.
/// `Cancelled` is reachable from any non-terminal state; cancelling a
/// pipeline that has no in-flight work still releases transient
/// resources but leaves `Idle`/`Done` unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Idle,
    Scheduled,
    Converting,
    Done,
    Cancelled,
}

/// A page image queued for annotation
#[derive(Clone, Debug, PartialEq, Eq)]
struct PageImage {
    page: usize,
    path: PathBuf,
}

struct ActiveJob {
    child: Child,
    image: PageImage,
}

/// Serial single-flight decoration driver for one document session
pub struct DecorationPipeline {
    config: DecorationConfig,
    status: PipelineStatus,
    pending: VecDeque<PageImage>,
    active: Option<ActiveJob>,
    scratch: Option<NamedTempFile>,
    retry_at: Option<Instant>,
    /// Whether completion may record the sentinel marker. False when a
    /// forced schedule converted a renderer's incomplete image set.
    mark_on_complete: bool,
}

impl DecorationPipeline {
    #[must_use]
    pub fn new(config: DecorationConfig) -> Self {
        Self {
            config,
            status: PipelineStatus::Idle,
            pending: VecDeque::new(),
            active: None,
            scratch: None,
            retry_at: None,
            mark_on_complete: true,
        }
    }

    #[must_use]
    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    /// Schedule decoration for the document.
    ///
    /// Always cancels existing scheduled/active work first, keeping at
    /// most one in-flight process per session. When the renderer has not
    /// finished producing page images and `immediate` is false, arms a
    /// fixed-delay retry instead of converting. An `immediate` schedule
    /// over an unready renderer converts whatever page images exist so
    /// far; the completion marker is then withheld, so a later schedule
    /// still decorates the pages rendered afterwards.
    pub fn schedule(
        &mut self,
        immediate: bool,
        links: &mut LinkCache,
        provider: &dyn LinkProvider,
        renderer: &dyn PageRenderer,
    ) {
        self.cancel();

        if !self.config.enabled {
            self.status = PipelineStatus::Idle;
            return;
        }

        let dir = renderer.cache_dir();
        if dir.join(DECORATION_MARKER).exists() {
            self.status = PipelineStatus::Done;
            return;
        }

        let ready = renderer.images_ready();
        if !ready && !immediate {
            self.retry_at = Some(Instant::now() + Duration::from_millis(self.config.retry_delay_ms));
            self.status = PipelineStatus::Scheduled;
            return;
        }

        self.mark_on_complete = ready;
        self.convert(&dir, links, provider);
    }

    /// Drive the pipeline one step. Safe to call at any time; does
    /// nothing unless a retry deadline passed or the active process
    /// finished.
    pub fn poll(
        &mut self,
        links: &mut LinkCache,
        provider: &dyn LinkProvider,
        renderer: &dyn PageRenderer,
    ) {
        match self.status {
            PipelineStatus::Scheduled => {
                if self.retry_at.is_some_and(|at| Instant::now() >= at) {
                    self.retry_at = None;
                    self.schedule(false, links, provider, renderer);
                }
            }
            PipelineStatus::Converting => self.poll_active(links, provider, renderer),
            _ => {}
        }
    }

    /// Kill active work and release transient resources. Idempotent and
    /// safe in every state, including a pipeline never scheduled.
    pub fn cancel(&mut self) {
        if let Some(mut job) = self.active.take() {
            let _ = job.child.kill();
            let _ = job.child.wait();
        }
        self.retry_at = None;
        self.pending.clear();
        // Dropping the scratch handle deletes the temp file
        self.scratch = None;

        if matches!(
            self.status,
            PipelineStatus::Scheduled | PipelineStatus::Converting
        ) {
            self.status = PipelineStatus::Cancelled;
        }
    }

    fn convert(&mut self, dir: &Path, links: &mut LinkCache, provider: &dyn LinkProvider) {
        self.pending = match page_images(dir) {
            Ok(images) => images,
            Err(e) => {
                warn!("Decoration: cannot list page images in {}: {e}", dir.display());
                self.status = PipelineStatus::Idle;
                return;
            }
        };

        match NamedTempFile::new() {
            Ok(scratch) => self.scratch = Some(scratch),
            Err(e) => {
                warn!("Decoration: cannot create scratch file: {e}");
                self.pending.clear();
                self.status = PipelineStatus::Idle;
                return;
            }
        }

        self.status = PipelineStatus::Converting;
        self.spawn_next(dir, links, provider);
    }

    fn poll_active(
        &mut self,
        links: &mut LinkCache,
        provider: &dyn LinkProvider,
        renderer: &dyn PageRenderer,
    ) {
        let Some(job) = self.active.as_mut() else {
            return;
        };

        let finished = match job.child.try_wait() {
            Ok(None) => return,
            Ok(Some(exit)) => exit.success(),
            Err(e) => {
                warn!("Decoration: lost track of annotation process: {e}");
                false
            }
        };

        let Some(job) = self.active.take() else {
            return;
        };

        if finished {
            self.apply_scratch(&job.image, renderer);
        } else {
            warn!(
                "Decoration: annotation failed for page {}, skipping",
                job.image.page
            );
        }

        let dir = renderer.cache_dir();
        self.spawn_next(&dir, links, provider);
    }

    /// Atomically replace the page image with the scratch output, then
    /// tell the display layer its cached render is stale.
    fn apply_scratch(&self, image: &PageImage, renderer: &dyn PageRenderer) {
        let Some(scratch) = self.scratch.as_ref() else {
            return;
        };

        let produced = fs::metadata(scratch.path()).map(|m| m.len() > 0).unwrap_or(false);
        if !produced {
            warn!(
                "Decoration: no output produced for page {}, skipping",
                image.page
            );
            return;
        }

        // Rename within the image's own directory so the swap is atomic
        let staging = image.path.with_extension("decorating");
        let result = fs::copy(scratch.path(), &staging)
            .and_then(|_| fs::rename(&staging, &image.path));

        match result {
            Ok(()) => {
                debug!("Decorated page {} image {}", image.page, image.path.display());
                renderer.invalidate_image(&image.path);
            }
            Err(e) => {
                let _ = fs::remove_file(&staging);
                warn!(
                    "Decoration: cannot replace page {} image: {e}",
                    image.page
                );
            }
        }
    }

    /// Launch the next queued file; on an empty queue, mark the document
    /// done and release transient resources.
    fn spawn_next(&mut self, dir: &Path, links: &mut LinkCache, provider: &dyn LinkProvider) {
        while let Some(image) = self.pending.pop_front() {
            match self.spawn_job(&image, links, provider) {
                Ok(child) => {
                    self.active = Some(ActiveJob { child, image });
                    return;
                }
                Err(e) => {
                    warn!(
                        "Decoration: cannot start annotation for page {}: {e}",
                        image.page
                    );
                }
            }
        }

        self.complete(dir);
    }

    fn spawn_job(
        &self,
        image: &PageImage,
        links: &mut LinkCache,
        provider: &dyn LinkProvider,
    ) -> std::io::Result<Child> {
        let rects = self.page_rects(image, links, provider);
        let scratch_path = self
            .scratch
            .as_ref()
            .map(NamedTempFile::path)
            .ok_or_else(|| std::io::Error::other("scratch file released"))?;

        let args = self.config.args.expand(&ExpandCtx {
            input: Some(&image.path),
            output: Some(scratch_path),
            foreground: &self.config.foreground,
            background: &self.config.background,
            rects: &rects,
            ..Default::default()
        });

        // Start from an empty scratch so a tool that silently writes
        // nothing is detected as a missing output
        fs::write(scratch_path, b"")?;

        Command::new(&self.config.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    }

    /// Scaled link rectangles for a page image, in that image's pixel
    /// space. Link or size lookup failures degrade to an outline-free
    /// annotation pass rather than aborting the queue.
    fn page_rects(
        &self,
        image: &PageImage,
        links: &mut LinkCache,
        provider: &dyn LinkProvider,
    ) -> Vec<PixelRect> {
        let (width, height) = match imagesize::size(&image.path) {
            Ok(dim) => (dim.width as u32, dim.height as u32),
            Err(e) => {
                warn!(
                    "Decoration: cannot read dimensions of {}: {e}",
                    image.path.display()
                );
                return Vec::new();
            }
        };

        match links.links(image.page, provider) {
            Ok(page_links) => page_links
                .iter()
                .map(|link| link.rect.to_pixels(width, height))
                .collect(),
            Err(e) => {
                warn!("Decoration: no links for page {}: {e}", image.page);
                Vec::new()
            }
        }
    }

    fn complete(&mut self, dir: &Path) {
        if self.mark_on_complete {
            if let Err(e) = fs::File::create(dir.join(DECORATION_MARKER)) {
                warn!("Decoration: cannot write completion marker: {e}");
            }
        } else {
            debug!(
                "Decoration: renderer incomplete, not marking {}",
                dir.display()
            );
        }
        self.scratch = None;
        self.active = None;
        self.status = PipelineStatus::Done;
        debug!("Decoration complete for {}", dir.display());
    }
}

/// Page-image files in a cache directory, sorted by page number.
/// Relies on the renderer's `page-<N>.<ext>` naming contract.
fn page_images(dir: &Path) -> std::io::Result<VecDeque<PageImage>> {
    let mut images = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(page) = parse_page_number(name) {
            images.push(PageImage { page, path });
        }
    }

    images.sort_by_key(|img| img.page);
    Ok(images.into())
}

fn parse_page_number(name: &str) -> Option<usize> {
    let rest = name.strip_prefix("page-")?;
    let digits = rest.split_once('.').map_or(rest, |(num, _ext)| num);
    digits.parse().ok()
}
