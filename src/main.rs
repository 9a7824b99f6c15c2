use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use structopt::StructOpt;
use tracing::{info, Level};

use trifade::animator::{Animator, Playback};
use trifade::color::Hsv;
use trifade::encode::{EncodeConfig, FfmpegSink, FrameSink, PngSequenceSink};
use trifade::export::{export_animation, export_frame};
use trifade::geometry::{parse_polygon, parse_polygons, Polygon};
use trifade::params::{Params, Toggles};
use trifade::raster::{Renderer, SoftwareRenderer};

#[derive(StructOpt, Debug)]
#[structopt(name = "trifade", about = "Animated Delaunay triangulations of moving points")]
struct Opt {
    /// Increase log verbosity, can be repeated.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    #[structopt(flatten)]
    scene: SceneArgs,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt, Debug)]
enum Command {
    /// Render a single frame as a png.
    Frame {
        #[structopt(long, parse(from_os_str))]
        out: PathBuf,

        /// Frames to simulate before rendering.
        #[structopt(long, default_value = "0")]
        advance: usize,
    },
    /// Render an mp4 video, requires `ffmpeg` on PATH.
    Render {
        #[structopt(long, parse(from_os_str))]
        out: PathBuf,

        /// Refuse to replace an existing file.
        #[structopt(long)]
        no_overwrite: bool,
    },
    /// Render the animation as a directory of numbered pngs.
    Frames {
        #[structopt(long, parse(from_os_str))]
        dir: PathBuf,
    },
    /// Run the animation in real time, logging stats and optionally saving the last frame.
    Preview {
        #[structopt(long, default_value = "5")]
        seconds: f64,

        #[structopt(long, parse(from_os_str))]
        out: Option<PathBuf>,
    },
}

#[derive(StructOpt, Debug)]
struct SceneArgs {
    #[structopt(long, default_value = "1080")]
    width: u32,
    #[structopt(long, default_value = "1920")]
    height: u32,
    #[structopt(long, default_value = "30")]
    fps: f64,
    /// Exported animation length in seconds.
    #[structopt(long, default_value = "5")]
    duration: f64,

    /// Number of free moving points.
    #[structopt(long, default_value = "50")]
    points: usize,
    #[structopt(long, default_value = "20")]
    point_size: f64,
    #[structopt(long, default_value = "4")]
    line_width: f64,
    /// Free point speed in pixels per frame.
    #[structopt(long, default_value = "16")]
    speed: f64,
    /// Triangle brightness jitter in percent.
    #[structopt(long, default_value = "50")]
    brightness_range: f64,
    /// Full fades per second.
    #[structopt(long, default_value = "2")]
    transition_speed: f64,

    #[structopt(long, default_value = "0")]
    hue: f64,
    #[structopt(long, default_value = "100")]
    saturation: f64,
    #[structopt(long, default_value = "50")]
    value: f64,
    #[structopt(long, default_value = "0")]
    bg_hue: f64,
    #[structopt(long, default_value = "100")]
    bg_saturation: f64,
    #[structopt(long, default_value = "0")]
    bg_value: f64,

    #[structopt(long)]
    no_fixed_corners: bool,
    #[structopt(long)]
    no_side_oscillators: bool,
    #[structopt(long)]
    hide_points: bool,
    #[structopt(long)]
    hide_lines: bool,
    #[structopt(long)]
    fill_triangles: bool,

    /// Obstacle polygon as `(x,y),(x,y),(x,y)`, can be repeated.
    #[structopt(long = "polygon", parse(try_from_str = parse_polygon_arg))]
    polygons: Vec<Polygon>,

    /// File with one obstacle polygon per line.
    #[structopt(long, parse(from_os_str))]
    polygons_file: Option<PathBuf>,

    #[structopt(long, default_value = "0")]
    seed: u64,
}

fn parse_polygon_arg(s: &str) -> Result<Polygon, String> {
    parse_polygon(1, s).map_err(|e| e.to_string())
}

impl SceneArgs {
    fn params(&self) -> anyhow::Result<Params> {
        let mut polygons = self.polygons.clone();

        if let Some(path) = &self.polygons_file {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read polygons file '{}'", path.display()))?;
            let (parsed, errors) = parse_polygons(&text);
            if !errors.is_empty() {
                info!(skipped = errors.len(), "some polygons could not be parsed");
            }
            polygons.extend(parsed);
        }

        let params = Params {
            width: self.width,
            height: self.height,
            fps: self.fps,
            duration: self.duration,
            num_points: self.points,
            point_size: self.point_size,
            line_width: self.line_width,
            toggles: Toggles {
                fixed_corners: !self.no_fixed_corners,
                side_oscillators: !self.no_side_oscillators,
                show_points: !self.hide_points,
                show_lines: !self.hide_lines,
                fill_triangles: self.fill_triangles,
            },
            speed: self.speed,
            brightness_range: self.brightness_range,
            transition_speed: self.transition_speed,
            main_color: Hsv::new(self.hue, self.saturation, self.value),
            background: Hsv::new(self.bg_hue, self.bg_saturation, self.bg_value),
            polygons,
            seed: self.seed,
        };

        let (params, _issues) = params.sanitized();
        Ok(params)
    }
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let params = opt.scene.params()?;
    let mut animator = Animator::new(params.seed);
    let mut renderer = SoftwareRenderer::new(params.width, params.height);

    match opt.cmd {
        Command::Frame { out, advance } => {
            animator.reset(&params);
            for _ in 0..advance {
                animator.advance(&params);
            }
            export_frame(&mut animator, &params, &mut renderer, &out)?;
            eprintln!("wrote {}", out.display());
        }
        Command::Render { out, no_overwrite } => {
            let mut cfg = EncodeConfig::new(&out, params.width, params.height, params.fps);
            cfg.overwrite = !no_overwrite;
            let sink = FfmpegSink::create(cfg)?;
            export(&mut animator, &params, &mut renderer, Box::new(sink))?;
            eprintln!("wrote {}", out.display());
        }
        Command::Frames { dir } => {
            let sink = PngSequenceSink::create(&dir)?;
            export(&mut animator, &params, &mut renderer, Box::new(sink))?;
            eprintln!("wrote frames to {}", dir.display());
        }
        Command::Preview { seconds, out } => {
            preview(&mut animator, &params, seconds)?;
            if let Some(out) = out {
                export_frame(&mut animator, &params, &mut renderer, &out)?;
                eprintln!("wrote {}", out.display());
            }
        }
    }

    Ok(())
}

fn export(
    animator: &mut Animator,
    params: &Params,
    renderer: &mut SoftwareRenderer,
    sink: Box<dyn FrameSink>,
) -> anyhow::Result<()> {
    let mut last_percent = 0;
    let summary = export_animation(animator, params, renderer, sink, |done, total| {
        let percent = done * 100 / total.max(1);
        if percent >= last_percent + 10 || done == total {
            last_percent = percent;
            info!(done, total, "{}%", percent);
        }
    })
    .context("export failed")?;

    eprintln!(
        "rendered {} frames in {:.2}s",
        summary.frames, summary.seconds
    );
    Ok(())
}

fn preview(animator: &mut Animator, params: &Params, seconds: f64) -> anyhow::Result<()> {
    let interval = Playback::interval(params.fps);
    let mut playback = Playback::default();
    let mut renderer = SoftwareRenderer::new(params.width, params.height);

    animator.reset(params);
    playback.start();

    let start = Instant::now();
    let mut last_report = Instant::now();
    let mut frames = 0;

    while start.elapsed().as_secs_f64() < seconds {
        let tick = Instant::now();

        let frame = playback.tick(animator, params);
        renderer.draw(&frame);
        frames += 1;

        if last_report.elapsed() >= Duration::from_secs(1) {
            info!(
                frames,
                triangles = animator.triangles().len(),
                tracked = animator.transitions().triangle_count(),
                edges = animator.transitions().edge_count(),
                "preview"
            );
            last_report = Instant::now();
        }

        if let Some(rest) = interval.checked_sub(tick.elapsed()) {
            thread::sleep(rest);
        }
    }

    playback.stop();
    eprintln!("previewed {} frames", frames);
    Ok(())
}
