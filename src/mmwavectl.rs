// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::Args;
use clap::Parser;
use mmwave::{
    config::{cfg_lines, Configuration},
    frame::{self, DecodeError, Frame, MAGIC_WORD},
    session::{Session, SessionOptions},
};
use serde_json::json;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt as _, Layer as _, Registry};
use tracy_client::{frame_mark, plot};

#[cfg(feature = "profiling")]
#[global_allocator]
static GLOBAL: tracy_client::ProfiledAllocator<std::alloc::System> =
    tracy_client::ProfiledAllocator::new(std::alloc::System, 100);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    args.validate()?;

    args.tracy.then(tracy_client::Client::start);

    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr)
        .with_filter(args.rust_log);

    let journald = match tracing_journald::layer() {
        Ok(journald) => Some(journald.with_filter(args.rust_log)),
        Err(_) => None,
    };

    let tracy = match args.tracy {
        true => Some(tracing_tracy::TracyLayer::default().with_filter(args.rust_log)),
        false => None,
    };

    let subscriber = Registry::default()
        .with(stdout_log)
        .with(journald)
        .with(tracy);
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
    tracing_log::LogTracer::init()?;

    if let Some(path) = &args.replay {
        return replay(path, &args);
    }

    if args.render {
        let mut config = Configuration::new(args.platform);
        load_config(&mut config, &args)?;
        for line in config.render_all(true, true) {
            println!("{}", line);
        }
        return Ok(());
    }

    let mut session = Session::open(
        &args.control_port,
        args.control_baud,
        &args.data_port,
        args.data_baud,
        SessionOptions::from(&args),
    )?;
    load_config(session.config_mut(), &args)?;
    info!("derived parameters: {:?}", session.config().derived);

    session.send_config()?;
    session.sensor_start()?;

    let frames = session.frames();
    let frames = frames.as_async();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping sensor");
                break;
            }
            frame = frames.recv() => match frame {
                Ok(frame) => print_frame(&frame, &args),
                Err(err) => {
                    error!("frame queue closed: {:?}", err);
                    break;
                }
            }
        }
    }

    session.sensor_stop()?;
    Ok(())
}

fn load_config(config: &mut Configuration, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &args.config {
        let text = std::fs::read_to_string(path)?;
        let accepted = config.load(cfg_lines(&text));
        info!("loaded {} commands from {}", accepted, path.display());
    }

    if let Some(db) = args.cfar_threshold_db {
        match config.set_cfar_threshold_db(db) {
            Some(scale) => info!("cfar threshold {} dB, scale {}", db, scale),
            None => warn!("cfar threshold {} dB not applied", db),
        }
    }
    if let Some(enabled) = args.clutter_removal {
        config.set_clutter_removal(enabled);
    }
    if let Some(periodicity) = args.frame_periodicity {
        config.set_frame_periodicity(periodicity);
    }

    Ok(())
}

/// Decodes every frame of a recorded data port stream.
fn replay(path: &Path, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let capture = std::fs::read(path)?;
    let mut index = 0;
    let mut decoded = 0;

    loop {
        match frame::decode(&capture, index) {
            Ok((frame, end)) => {
                index = end;
                if frame.is_complete {
                    decoded += 1;
                    print_frame(&frame, args);
                } else {
                    warn!("incomplete frame {}", frame.header.frame_number);
                }
            }
            Err(DecodeError::InvalidPacketLength { offset, length }) => {
                warn!("invalid packet length {} at {}", length, offset);
                index = offset + MAGIC_WORD.len();
            }
            Err(DecodeError::Incomplete { offset, .. }) => {
                warn!("capture ends inside a frame at {}", offset);
                break;
            }
            Err(DecodeError::FrameNotFound) => break,
            Err(err) => {
                error!("replay failed: {}", err);
                break;
            }
        }
    }

    info!("decoded {} frames from {}", decoded, path.display());
    Ok(())
}

fn print_frame(frame: &Frame, args: &Args) {
    let positions = frame
        .detected_objects
        .as_ref()
        .map(|objects| objects.positions())
        .unwrap_or_default();

    if args.tracy {
        plot!("detected objects", positions.len() as f64);
        frame_mark();
    }

    if args.json {
        let stats = frame.stats_info.as_ref().map(|stats| {
            json!({
                "inter_frame_processing_time": stats.inter_frame_processing_time,
                "transmit_output_time": stats.transmit_output_time,
                "inter_frame_processing_margin": stats.inter_frame_processing_margin,
                "inter_chirp_processing_margin": stats.inter_chirp_processing_margin,
                "active_frame_cpu_load": stats.active_frame_cpu_load,
                "inter_frame_cpu_load": stats.inter_frame_cpu_load,
            })
        });
        println!(
            "{}",
            json!({
                "frame_number": frame.header.frame_number,
                "sub_frame_number": frame.header.sub_frame_number,
                "time_cpu_cycles": frame.header.time_cpu_cycles,
                "objects": positions,
                "stats": stats,
            })
        );
    } else {
        println!("{}", frame);
        for [x, y, z] in positions {
            println!("    x: {:8.3} y: {:8.3} z: {:8.3}", x, y, z);
        }
    }
}
