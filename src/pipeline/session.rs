use std::sync::mpsc;
use std::time::Instant;

use rayon::prelude::*;

use crate::composite::{Anchor, composite};
use crate::config::ComposeConfig;
use crate::effect::{EffectSample, EffectTimeline};
use crate::encode::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{ComposeError, ComposeResult};
use crate::frame::{CompositeFrame, Frame, FrameRGBA, SharedFrame};
use crate::key::ChromaKeyer;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::pairing::{FgEndPolicy, FramePairer};
use crate::pipeline::progress::{Progress, ProgressReporter};
use crate::pipeline::reader::{ReadOutcome, RetryingReader};
use crate::pipeline::reorder::{ReorderBuffer, Slot};
use crate::source::{FrameSource, SourceInfo};
use crate::subtitle::SubtitleTrack;

/// Options controlling how a run is executed.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionOpts {
    /// Composite frames on a dedicated rayon pool.
    pub parallel: bool,
    /// Worker thread count for the pool; `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Frames handed to the pool at once.
    pub chunk_size: usize,
    /// Capacity of each bounded stage channel.
    pub channel_capacity: usize,
    /// Extra attempts for a frame that fails to decode.
    pub retry_count: u32,
    /// Undecodable frames tolerated per run before the run fails.
    pub max_skipped_frames: u32,
    pub fg_end_policy: FgEndPolicy,
    /// Seed for the randomized hold durations.
    pub seed: u64,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            chunk_size: 16,
            channel_capacity: 8,
            retry_count: 2,
            max_skipped_frames: 5,
            fg_end_policy: FgEndPolicy::Hold,
            seed: 0,
        }
    }
}

impl SessionOpts {
    pub fn validate(&self) -> ComposeResult<()> {
        if self.threads == Some(0) {
            return Err(ComposeError::config("'threads' must be >= 1 when set"));
        }
        if self.chunk_size == 0 {
            return Err(ComposeError::config("'chunk_size' must be >= 1"));
        }
        if self.channel_capacity == 0 {
            return Err(ComposeError::config("'channel_capacity' must be >= 1"));
        }
        Ok(())
    }
}

/// Counters for a completed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Background frames seen, composited or skipped.
    pub frames_total: u64,
    pub frames_composited: u64,
    pub frames_skipped: u64,
    pub decode_retries: u64,
    /// Times the foreground restarted under [`FgEndPolicy::Loop`].
    pub foreground_loops: u64,
}

/// A configured compositor. Front-loads validation; each [`run`](ComposeSession::run) streams one
/// background/foreground pair into a sink.
pub struct ComposeSession {
    config: ComposeConfig,
    subtitles: Option<SubtitleTrack>,
    progress: Option<Box<dyn ProgressReporter>>,
    cancel: CancelToken,
}

impl ComposeSession {
    pub fn new(config: ComposeConfig) -> ComposeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            subtitles: None,
            progress: None,
            cancel: CancelToken::new(),
        })
    }

    pub fn config(&self) -> &ComposeConfig {
        &self.config
    }

    /// Burn `track` into the output of sinks that support subtitles.
    pub fn with_subtitles(mut self, track: SubtitleTrack) -> Self {
        self.subtitles = Some(track);
        self
    }

    pub fn with_progress(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.progress = Some(Box::new(reporter));
        self
    }

    /// Token that cancels the current or next run when triggered.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Composite a single background frame at `elapsed` seconds into the effect.
    pub fn render_frame(
        &self,
        background: Frame,
        foreground: &Frame,
        elapsed: f64,
    ) -> ComposeResult<CompositeFrame> {
        let timeline = EffectTimeline::new(
            self.config.effect.clone(),
            self.config.session.seed,
            elapsed.max(0.0),
        )?;
        let keyer = ChromaKeyer::new(self.config.key.resolved_for(&foreground.image)?)?;
        let anchor = self
            .config
            .placement
            .resolve(background.image.canvas(), foreground.image.canvas());
        let ctx = FrameCtx {
            timeline: &timeline,
            keyer: &keyer,
            anchor,
            bg_canvas: background.image.canvas(),
            fg_canvas: foreground.image.canvas(),
        };
        ctx.process(background, foreground, elapsed)
    }

    /// Composite `foreground` over every frame of `background` and stream the result to `sink`.
    ///
    /// The sink receives `end()` on success and `abort()` on any failure, including
    /// cancellation.
    #[tracing::instrument(skip_all, fields(seed = self.config.session.seed))]
    pub fn run(
        &mut self,
        background: &mut dyn FrameSource,
        foreground: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
    ) -> ComposeResult<RunStats> {
        let opts = self.config.session.clone();
        let bg_info = background.info().clone();
        let bg_canvas = bg_info.canvas();
        if bg_canvas.pixel_count() == 0 {
            return Err(ComposeError::config(format!(
                "background has empty dimensions {bg_canvas}"
            )));
        }

        let timeline = EffectTimeline::new(
            self.config.effect.clone(),
            opts.seed,
            timeline_horizon(&bg_info),
        )?;
        let pool = if opts.parallel {
            Some(build_thread_pool(opts.threads)?)
        } else {
            None
        };

        let mut reader = RetryingReader::new(opts.retry_count, opts.max_skipped_frames);
        let first_fg = loop {
            match reader.read(foreground, "foreground")? {
                ReadOutcome::Frame(frame) => break frame,
                ReadOutcome::Skipped(_) => continue,
                ReadOutcome::End => {
                    return Err(ComposeError::config("foreground source has no frames"));
                }
            }
        };
        let fg_canvas = first_fg.image.canvas();
        let keyer = ChromaKeyer::new(self.config.key.resolved_for(&first_fg.image)?)?;
        let anchor = self.config.placement.resolve(bg_canvas, fg_canvas);
        let pairer = FramePairer::new(
            first_fg,
            opts.fg_end_policy,
            foreground.info().fps.frame_duration_secs(),
        );

        tracing::debug!(
            background = %bg_canvas,
            foreground = %fg_canvas,
            fps = bg_info.fps.as_f64(),
            key = %keyer.params().key_color,
            anchor_x = anchor.point().x,
            anchor_y = anchor.point().y,
            cycles = timeline.cycles().len(),
            parallel = opts.parallel,
            "compose run starting"
        );

        let mut sink_cfg = SinkConfig::new(bg_canvas, bg_info.fps);
        if bg_info.has_audio {
            sink_cfg.audio_source = bg_info.path.clone();
        }
        sink_cfg.subtitles = self.subtitles.clone();

        self.cancel.reset();
        let started = Instant::now();
        let ctx = FrameCtx {
            timeline: &timeline,
            keyer: &keyer,
            anchor,
            bg_canvas,
            fg_canvas,
        };
        let stages = Stages {
            ctx: &ctx,
            cancel: &self.cancel,
            pool: pool.as_ref(),
            chunk_size: opts.chunk_size,
            capacity: opts.channel_capacity,
            frames_total: bg_info.estimated_frames(),
            started,
        };

        if let Err(e) = sink.begin(sink_cfg) {
            sink.abort();
            return Err(e);
        }
        let res = stages.run(
            background,
            foreground,
            reader,
            pairer,
            sink,
            self.progress
                .as_mut()
                .map(|p| &mut **p as &mut dyn ProgressReporter),
        );
        let stats = match res {
            Ok(stats) => stats,
            Err(e) => {
                tracing::debug!(error = %e, "compose run failed, aborting sink");
                sink.abort();
                return Err(e);
            }
        };
        if let Err(e) = sink.end() {
            sink.abort();
            return Err(e);
        }

        tracing::info!(
            frames = stats.frames_total,
            composited = stats.frames_composited,
            skipped = stats.frames_skipped,
            retries = stats.decode_retries,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "compose run finished"
        );
        Ok(stats)
    }
}

/// Immutable per-run state shared by every worker.
struct FrameCtx<'a> {
    timeline: &'a EffectTimeline,
    keyer: &'a ChromaKeyer,
    anchor: Anchor,
    bg_canvas: Canvas,
    fg_canvas: Canvas,
}

impl FrameCtx<'_> {
    fn process(
        &self,
        background: Frame,
        foreground: &Frame,
        elapsed: f64,
    ) -> ComposeResult<CompositeFrame> {
        let seq = background.seq.0;
        let pts = background.pts;
        let sample = self.timeline.sample(elapsed);
        self.process_inner(background, foreground, sample)
            .map_err(|e| ComposeError::pipeline(seq, pts, Some(sample.phase), e))
    }

    fn process_inner(
        &self,
        background: Frame,
        foreground: &Frame,
        sample: EffectSample,
    ) -> ComposeResult<CompositeFrame> {
        let seq = background.seq.0;
        if background.image.canvas() != self.bg_canvas {
            return Err(ComposeError::dimension_mismatch(
                seq,
                format!(
                    "background frame is {}, stream is {}",
                    background.image.canvas(),
                    self.bg_canvas
                ),
            ));
        }
        if foreground.image.canvas() != self.fg_canvas {
            return Err(ComposeError::dimension_mismatch(
                seq,
                format!(
                    "foreground frame {} is {}, stream is {}",
                    foreground.seq,
                    foreground.image.canvas(),
                    self.fg_canvas
                ),
            ));
        }
        let mask = self.keyer.extract_image(&foreground.image, seq)?;
        composite(background, &foreground.image, &mask, sample.scale, self.anchor)
    }
}

enum WorkMsg {
    Pair {
        background: Frame,
        foreground: SharedFrame,
        elapsed: f64,
    },
    Skip(FrameIndex),
}

/// Why a parallel chunk stopped early.
enum WorkStop {
    Closed,
    Failed(ComposeError),
}

struct OutMsg {
    idx: u64,
    frame: Option<FrameRGBA>,
}

#[derive(Default)]
struct DecodeStats {
    frames: u64,
    skipped: u64,
    retries: u64,
    loops: u64,
}

#[derive(Default)]
struct EncodeStats {
    composited: u64,
    skipped: u64,
}

struct Stages<'a> {
    ctx: &'a FrameCtx<'a>,
    cancel: &'a CancelToken,
    pool: Option<&'a rayon::ThreadPool>,
    chunk_size: usize,
    capacity: usize,
    frames_total: Option<u64>,
    started: Instant,
}

impl Stages<'_> {
    fn run(
        &self,
        background: &mut dyn FrameSource,
        foreground: &mut dyn FrameSource,
        reader: RetryingReader,
        pairer: FramePairer,
        sink: &mut dyn FrameSink,
        progress: Option<&mut dyn ProgressReporter>,
    ) -> ComposeResult<RunStats> {
        std::thread::scope(|scope| -> ComposeResult<RunStats> {
            let (work_tx, work_rx) = mpsc::sync_channel::<WorkMsg>(self.capacity);
            let (out_tx, out_rx) = mpsc::sync_channel::<OutMsg>(self.capacity);

            let dec = scope
                .spawn(move || self.decode(background, foreground, reader, pairer, work_tx));
            let enc = scope.spawn(move || self.encode(out_rx, sink, progress));

            let work_res = self.work(work_rx, out_tx);

            let dec_res = dec
                .join()
                .map_err(|_| ComposeError::resource("decode thread panicked"))?;
            let enc_res = enc
                .join()
                .map_err(|_| ComposeError::resource("encoder thread panicked"))?;

            // A stage that stopped because its peer went away reports Ok, so the first
            // non-cancellation error is the root failure.
            if dec_res.is_err() || work_res.is_err() || enc_res.is_err() {
                return Err(first_real_error(dec_res, work_res, enc_res));
            }
            if self.cancel.is_cancelled() {
                return Err(ComposeError::Cancelled);
            }

            let dec = dec_res?;
            let enc = enc_res?;
            Ok(RunStats {
                frames_total: dec.frames,
                frames_composited: enc.composited,
                frames_skipped: dec.skipped,
                decode_retries: dec.retries,
                foreground_loops: dec.loops,
            })
        })
    }

    fn decode(
        &self,
        background: &mut dyn FrameSource,
        foreground: &mut dyn FrameSource,
        mut reader: RetryingReader,
        mut pairer: FramePairer,
        tx: mpsc::SyncSender<WorkMsg>,
    ) -> ComposeResult<DecodeStats> {
        let mut stats = DecodeStats::default();
        let mut origin: Option<f64> = None;
        let fps = background.info().fps;

        loop {
            if self.cancel.is_cancelled() {
                return Err(ComposeError::Cancelled);
            }
            let outcome = reader.read(background, "background").map_err(|e| {
                let seq = match &e {
                    ComposeError::FrameDecode { seq, .. } => *seq,
                    _ => stats.frames,
                };
                let pts = fps.frames_to_secs(seq);
                let elapsed = pts - origin.unwrap_or(0.0);
                let phase = self.ctx.timeline.sample(elapsed).phase;
                ComposeError::pipeline(seq, pts, Some(phase), e)
            })?;

            let msg = match outcome {
                ReadOutcome::Frame(bg) => {
                    let base = *origin.get_or_insert(bg.pts);
                    let elapsed = bg.pts - base;
                    let fg = pairer
                        .frame_for(elapsed, foreground, &mut reader)
                        .map_err(|e| {
                            let phase = self.ctx.timeline.sample(elapsed).phase;
                            ComposeError::pipeline(bg.seq.0, bg.pts, Some(phase), e)
                        })?;
                    WorkMsg::Pair {
                        background: bg,
                        foreground: fg,
                        elapsed,
                    }
                }
                ReadOutcome::Skipped(idx) => {
                    stats.skipped += 1;
                    WorkMsg::Skip(idx)
                }
                ReadOutcome::End => break,
            };
            stats.frames += 1;
            if tx.send(msg).is_err() {
                // Downstream stopped; it reports its own error.
                break;
            }
        }

        stats.retries = reader.retries();
        stats.loops = pairer.loops();
        Ok(stats)
    }

    /// Runs on the calling thread. Takes both channel ends by value so they close when it
    /// returns.
    fn work(&self, rx: mpsc::Receiver<WorkMsg>, tx: mpsc::SyncSender<OutMsg>) -> ComposeResult<()> {
        match self.pool {
            None => {
                for msg in rx.iter() {
                    if self.cancel.is_cancelled() {
                        return Err(ComposeError::Cancelled);
                    }
                    let out = self.work_one(msg)?;
                    if tx.send(out).is_err() {
                        return Ok(());
                    }
                }
                Ok(())
            }
            Some(pool) => {
                let mut chunk = Vec::with_capacity(self.chunk_size);
                let mut open = true;
                while open {
                    chunk.clear();
                    while chunk.len() < self.chunk_size {
                        match rx.recv() {
                            Ok(msg) => chunk.push(msg),
                            Err(_) => {
                                open = false;
                                break;
                            }
                        }
                    }
                    if chunk.is_empty() {
                        break;
                    }
                    if self.cancel.is_cancelled() {
                        return Err(ComposeError::Cancelled);
                    }
                    let res = pool.install(|| {
                        chunk
                            .par_drain(..)
                            .try_for_each_with(tx.clone(), |tx, msg| -> Result<(), WorkStop> {
                                let out = self.work_one(msg).map_err(WorkStop::Failed)?;
                                tx.send(out).map_err(|_| WorkStop::Closed)
                            })
                    });
                    match res {
                        Ok(()) => {}
                        // The encoder hung up and reports its own failure.
                        Err(WorkStop::Closed) => return Ok(()),
                        Err(WorkStop::Failed(e)) => return Err(e),
                    }
                }
                Ok(())
            }
        }
    }

    fn work_one(&self, msg: WorkMsg) -> ComposeResult<OutMsg> {
        match msg {
            WorkMsg::Pair {
                background,
                foreground,
                elapsed,
            } => {
                let idx = background.seq.0;
                let out = self.ctx.process(background, &foreground, elapsed)?;
                Ok(OutMsg {
                    idx,
                    frame: Some(out.image),
                })
            }
            WorkMsg::Skip(idx) => Ok(OutMsg {
                idx: idx.0,
                frame: None,
            }),
        }
    }

    fn encode(
        &self,
        rx: mpsc::Receiver<OutMsg>,
        sink: &mut dyn FrameSink,
        mut progress: Option<&mut dyn ProgressReporter>,
    ) -> ComposeResult<EncodeStats> {
        let mut stats = EncodeStats::default();
        let mut reorder = ReorderBuffer::<FrameRGBA>::new(0);
        for msg in rx.iter() {
            if self.cancel.is_cancelled() {
                return Err(ComposeError::Cancelled);
            }
            let slot = match msg.frame {
                Some(frame) => Slot::Frame(frame),
                None => Slot::Skipped,
            };
            if !reorder.insert(msg.idx, slot) {
                return Err(ComposeError::resource(format!(
                    "duplicate or stale frame index {} at encoder",
                    msg.idx
                )));
            }
            while let Some((idx, slot)) = reorder.pop_ready() {
                match slot {
                    Slot::Frame(frame) => {
                        sink.push_frame(FrameIndex(idx), &frame)?;
                        stats.composited += 1;
                    }
                    Slot::Skipped => stats.skipped += 1,
                }
                if let Some(reporter) = progress.as_mut() {
                    reporter.report(Progress {
                        frames_processed: stats.composited + stats.skipped,
                        frames_total: self.frames_total,
                        elapsed: self.started.elapsed(),
                    });
                }
            }
        }
        if !reorder.is_empty() {
            return Err(ComposeError::resource(format!(
                "{} frames never became ready (waiting for {})",
                reorder.len(),
                reorder.next_index()
            )));
        }
        Ok(stats)
    }
}

/// Seconds of effect to pre-draw: the longer of the container duration and the frame count.
fn timeline_horizon(info: &SourceInfo) -> f64 {
    let counted = info
        .estimated_frames()
        .map_or(0.0, |n| info.fps.frames_to_secs(n));
    info.duration_secs.max(counted)
}

fn first_real_error<A, B, C>(
    a: ComposeResult<A>,
    b: ComposeResult<B>,
    c: ComposeResult<C>,
) -> ComposeError {
    [a.err(), b.err(), c.err()]
        .into_iter()
        .flatten()
        .find(|e| !matches!(e, ComposeError::Cancelled))
        .unwrap_or(ComposeError::Cancelled)
}

fn build_thread_pool(threads: Option<usize>) -> ComposeResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ComposeError::config("'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ComposeError::resource(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/session.rs"]
mod tests;
