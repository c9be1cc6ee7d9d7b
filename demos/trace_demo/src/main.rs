// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted compositor session that exercises the tracing pipeline.
//!
//! Runs a [`Session`] for a number of vsyncs, printing scheduler events with a
//! [`PrettyPrintSink`] while a [`RecorderSink`] captures them, then exports a
//! Chrome trace JSON file and prints the swap pacing report.
//!
//! ```text
//! trace_demo --frames 120 --script checkerboard.json --out trace.json
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;

use cadence_core::settings::SchedulerSettings;
use cadence_debug::pretty::PrettyPrintSink;
use cadence_debug::recorder::RecorderSink;
use cadence_harness::{HostScript, Session};

#[derive(Debug, Parser)]
#[command(name = "trace_demo", about = "Trace a scripted compositor session")]
struct Cli {
    /// Number of vsyncs to simulate.
    #[arg(short, long, default_value_t = 60)]
    frames: u64,

    /// Host behavior as JSON (missing fields use the animating defaults).
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Scheduler settings as JSON (missing fields use the defaults).
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Where to write the Chrome trace.
    #[arg(short, long, value_name = "FILE", default_value = "trace.json")]
    out: PathBuf,

    /// Only print frame summaries, not every action.
    #[arg(short, long)]
    quiet: bool,
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => load_json::<SchedulerSettings>(path)?,
        None => SchedulerSettings::default(),
    };
    let script = match &cli.script {
        Some(path) => load_json::<HostScript>(path)?,
        None => HostScript::default(),
    };

    // -- sinks -------------------------------------------------------------
    let pretty = PrettyPrintSink::stderr().show_actions(!cli.quiet);
    let recorder = RecorderSink::new();

    // -- session -----------------------------------------------------------
    let mut session = Session::with_trace_sink(settings, script, (pretty, recorder));
    let report = session.run(cli.frames);

    // -- export Chrome trace -----------------------------------------------
    let recorded = std::mem::take(&mut session.trace_sink_mut().1);
    let file =
        File::create(&cli.out).with_context(|| format!("creating {}", cli.out.display()))?;
    let mut writer = BufWriter::new(file);
    cadence_debug::chrome::export(recorded.as_bytes(), &mut writer)
        .with_context(|| format!("writing Chrome trace to {}", cli.out.display()))?;

    let stats = session.stats();
    let interval_ms = settings.begin_frame_interval.micros() as f64 / 1000.0;
    println!("Wrote {} ({} frames)", cli.out.display(), cli.frames);
    println!(
        "swaps={} forced={} failed={} commits={} aborted={} surfaces={}",
        stats.swaps,
        stats.forced_draws,
        stats.draws_failed,
        stats.commits,
        stats.main_frames_aborted,
        stats.surfaces_requested,
    );
    println!(
        "pacing grade {} ({:.1} misses per 1000 swaps, {} of {})",
        report.grade.as_str(),
        report.miss_rate_per_1000,
        report.missed_frames,
        report.total_frames,
    );
    println!(
        "[{}]",
        session
            .pacing()
            .sparkline_ascii(interval_ms * 0.5, interval_ms * 3.0)
    );
    Ok(())
}
