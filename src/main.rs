#[cfg(not(feature = "demo"))]
fn main() {
    eprintln!(
        "The spectrum-viz demo requires the \"demo\" feature. Rebuild with `--features demo` to run it."
    );
}

#[cfg(feature = "demo")]
mod cli {
    use std::env;
    use std::f32::consts::PI;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use anyhow::{bail, Context};
    use serde::Serialize;
    use spectrum_viz::{DecayMode, Path, SampleProducer, VisualizationEngine, VisualizerConfig};

    const SAMPLE_RATE: f32 = 48_000.0;
    const BLOCK_SIZE: usize = 512;
    const INPUT_CHANNELS: usize = 2;
    const SWEEP_START_HZ: f32 = 50.0;
    const SWEEP_END_HZ: f32 = 12_000.0;
    const WIDTH: f32 = 800.0;
    const HEIGHT: f32 = 200.0;

    const USAGE: &str = "Usage:\n  spectrum-viz [options]\n\nOptions:\n  --config <file>      Load a JSON configuration\n  --seconds <n>        Run time in seconds (default 3)\n  --decay <mode>       off | none | fast | medium | slow\n  --cutoff <hz>        Low-pass cutoff, 20 - 20000\n  --fallback <s>       Spectrum window in seconds, 0.1 - 10.0\n  --json               Print every frame's paths as JSON\n  -h, --help           Show this help\n\nRUST_LOG controls diagnostic output.\n";

    struct Options {
        config: Option<String>,
        seconds: f32,
        decay: Option<DecayMode>,
        cutoff: Option<f32>,
        fallback: Option<f32>,
        json: bool,
        help: bool,
    }

    #[derive(Serialize)]
    struct Frame<'a> {
        frame: usize,
        elapsed_ms: u64,
        waveform: &'a Path,
        spectrum: &'a Path,
    }

    fn parse_args() -> anyhow::Result<Options> {
        let mut options = Options {
            config: None,
            seconds: 3.0,
            decay: None,
            cutoff: None,
            fallback: None,
            json: false,
            help: false,
        };

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg.clone(), None),
            };
            let mut value = |name: &str| -> anyhow::Result<String> {
                match inline.clone().or_else(|| args.next()) {
                    Some(value) => Ok(value),
                    None => bail!("{name} requires an argument"),
                }
            };

            match flag.as_str() {
                "--config" => options.config = Some(value("--config")?),
                "--seconds" => {
                    options.seconds = value("--seconds")?
                        .parse()
                        .context("--seconds expects a number")?;
                }
                "--decay" => options.decay = Some(value("--decay")?.parse()?),
                "--cutoff" => {
                    options.cutoff = Some(
                        value("--cutoff")?
                            .parse()
                            .context("--cutoff expects a frequency in Hz")?,
                    );
                }
                "--fallback" => {
                    options.fallback = Some(
                        value("--fallback")?
                            .parse()
                            .context("--fallback expects a number of seconds")?,
                    );
                }
                "--json" => options.json = true,
                "--help" | "-h" => options.help = true,
                _ => bail!("Unknown argument: {arg}\n\n{USAGE}"),
            }
        }

        if !options.seconds.is_finite() {
            bail!("--seconds must be finite");
        }

        Ok(options)
    }

    /// Stereo exponential sweep, restarting every `period` seconds.
    fn fill_sweep(left: &mut [f32], right: &mut [f32], phase: &mut f32, time: &mut f32) {
        let period = 4.0;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let t = (*time % period) / period;
            let freq = SWEEP_START_HZ * (SWEEP_END_HZ / SWEEP_START_HZ).powf(t);
            *phase = (*phase + 2.0 * PI * freq / SAMPLE_RATE) % (2.0 * PI);
            *l = 0.4 * phase.sin();
            *r = 0.4 * (*phase * 0.5).sin();
            *time += 1.0 / SAMPLE_RATE;
        }
    }

    fn spawn_producer(
        mut producer: SampleProducer,
        running: Arc<AtomicBool>,
    ) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            producer.prepare(SAMPLE_RATE, INPUT_CHANNELS);
            let block_time = Duration::from_secs_f32(BLOCK_SIZE as f32 / SAMPLE_RATE);
            let mut left = vec![0.0f32; BLOCK_SIZE];
            let mut right = vec![0.0f32; BLOCK_SIZE];
            let mut phase = 0.0f32;
            let mut time = 0.0f32;

            while running.load(Ordering::Relaxed) {
                fill_sweep(&mut left, &mut right, &mut phase, &mut time);
                if let Err(e) = producer.process_block(&mut [&mut left[..], &mut right[..]]) {
                    log::error!("producer stopped: {e}");
                    return;
                }
                thread::sleep(block_time);
            }
        })
    }

    fn peak_frequency(engine: &VisualizationEngine) -> Option<f32> {
        let magnitudes = engine.analyzer().magnitudes();
        let window = magnitudes.len() * 2;
        let (bin, _) = magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))?;
        Some(bin as f32 * engine.sample_rate() / window as f32)
    }

    pub fn run() -> anyhow::Result<()> {
        let options = parse_args()?;
        if options.help {
            eprint!("{USAGE}");
            return Ok(());
        }

        let mut config = match &options.config {
            Some(path) => VisualizerConfig::load(path)
                .with_context(|| format!("failed to load configuration from {path}"))?,
            None => VisualizerConfig::default(),
        };
        if let Some(mode) = options.decay {
            config = config.with_decay_mode(mode);
        }
        if let Some(seconds) = options.fallback {
            config = config.with_fallback_seconds(seconds);
        }
        if let Some(hz) = options.cutoff {
            config = config.with_low_pass(hz);
        }

        let mut engine = VisualizationEngine::new(config)?;
        let config = engine.config().clone();
        log::info!(
            "running {:.1} s: decay {}, window {} s, cutoff {} Hz",
            options.seconds,
            config.decay_mode,
            config.fallback_seconds,
            config.low_pass_hz
        );

        let running = Arc::new(AtomicBool::new(true));
        let producer_thread = spawn_producer(engine.producer(), Arc::clone(&running));

        let frame_time = Duration::from_secs_f32(1.0 / config.refresh_rate_hz);
        let run_time = Duration::from_secs_f32(options.seconds.max(0.0));
        let start = Instant::now();
        let mut frame = 0;

        while start.elapsed() < run_time {
            thread::sleep(frame_time);
            frame += 1;

            let cutoff = engine.low_pass_frequency();
            let waveform = engine.waveform_path(BLOCK_SIZE, 0, HEIGHT, WIDTH)?;
            let spectrum = engine.spectrum_path(
                config.fallback_seconds,
                0,
                HEIGHT,
                WIDTH,
                config.decay_mode,
                cutoff,
            )?;

            if options.json {
                let frame = Frame {
                    frame,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                    waveform: &waveform,
                    spectrum: &spectrum,
                };
                println!("{}", serde_json::to_string(&frame)?);
            } else {
                let peak = peak_frequency(&engine)
                    .map(|hz| format!("{hz:>8.1} Hz"))
                    .unwrap_or_else(|| "      -- Hz".into());
                println!(
                    "frame {frame:>4}  waveform {:>5} pts  spectrum {:>6} pts in {} paths  peak {peak}",
                    waveform.vertex_count(),
                    spectrum.vertex_count(),
                    spectrum.sub_path_count(),
                );
            }
        }

        running.store(false, Ordering::Relaxed);
        if producer_thread.join().is_err() {
            bail!("producer thread panicked");
        }
        log::info!("{frame} frames rendered");

        Ok(())
    }
}

#[cfg(feature = "demo")]
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    cli::run()
}
