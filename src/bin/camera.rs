//! Camera client: replays frames from a directory (or a synthetic blank frame)
//! to the monitor API at a fixed interval and prints each verdict as ndjson.
//!
//! `proctor-camera enroll <student_id> <image>` registers a reference image and exits.

use proctor_monitor::{
    config::MonitorConfig,
    logging::{StructuredLogger, VerdictLine},
    uplink::{frame_files, read_frame, FrameUplink},
    Frame,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

static STOP: AtomicBool = AtomicBool::new(false);

enum Source {
    Files(Vec<PathBuf>),
    Synthetic(Vec<u8>),
}

impl Source {
    fn next(&self, cycle: usize) -> Result<(Vec<u8>, String), proctor_monitor::error::UplinkError> {
        match self {
            Source::Files(files) => {
                let path = &files[cycle % files.len()];
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "frame.jpg".to_string());
                Ok((read_frame(path)?, name))
            }
            Source::Synthetic(bytes) => Ok((bytes.clone(), "frame.jpg".to_string())),
        }
    }
}

fn open_source(frame_dir: Option<&Path>) -> Result<Source, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(dir) = frame_dir {
        let files = frame_files(dir)?;
        if !files.is_empty() {
            info!(dir = %dir.display(), frames = files.len(), "replaying frame directory");
            return Ok(Source::Files(files));
        }
        warn!(dir = %dir.display(), "no frames found; falling back to synthetic frame");
    }
    Ok(Source::Synthetic(Frame::blank(640, 480).encode_jpeg(85)?))
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = MonitorConfig::load(&MonitorConfig::default_path());
    StructuredLogger::init(config.log.json, &config.log.level);

    let uplink = FrameUplink::new(&config.camera)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [cmd, student_id, image] = args.as_slice() {
        if cmd == "enroll" {
            let res = uplink.enroll(student_id, Path::new(image))?;
            info!(student_id = %res.student_id, status = ?res.status, "enrollment response");
            return Ok(());
        }
    }

    let source = open_source(config.camera.frame_dir.as_deref())?;
    let _ = ctrlc::set_handler(|| STOP.store(true, Ordering::Relaxed));
    info!(camera_id = uplink.camera_id(), interval_ms = config.camera.interval_ms, "camera streaming (Ctrl+C to stop)");

    let stdout = std::io::stdout();
    let mut cycle: usize = 0;
    while !STOP.load(Ordering::Relaxed) {
        let sent = source
            .next(cycle)
            .and_then(|(bytes, name)| uplink.send_frame(bytes, &name));
        match sent {
            Ok(report) => {
                let mut out = stdout.lock();
                for line in VerdictLine::from_report(&report) {
                    StructuredLogger::emit_json(&line, &mut out);
                }
            }
            Err(e) => warn!(cycle, error = %e, "frame upload failed"),
        }
        cycle = cycle.wrapping_add(1);

        let mut waited = 0;
        while waited < config.camera.interval_ms && !STOP.load(Ordering::Relaxed) {
            let step = (config.camera.interval_ms - waited).min(100);
            std::thread::sleep(Duration::from_millis(step));
            waited += step;
        }
    }
    info!("camera client stopping");
    Ok(())
}
