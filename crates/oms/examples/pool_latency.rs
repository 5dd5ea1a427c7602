use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use oms::{Error, LatencyRecorder, LogSink, WorkerPool};

/// Runs a burst of simulated requests on four workers and logs their latency
/// to `latency_log.txt` in the current directory.
fn main() -> Result<ExitCode, Error> {
    let sink = LogSink::try_open("latency_log.txt")?;
    let recorder = LatencyRecorder::new(Arc::new(sink));
    let pool = WorkerPool::start(4)?;

    for i in 0..16u64 {
        let recorder = recorder.clone();
        let submitted_at = Instant::now();
        pool.execute(move || {
            // stand-in for a network round trip
            std::thread::sleep(Duration::from_millis(5 + i % 4 * 5));
            if i % 7 == 6 {
                return Err(Error::Network(format!("request {i} timed out")));
            }
            recorder.record("simulated_request", submitted_at.elapsed())?;
            Ok(())
        })?;
    }

    pool.shutdown();
    println!("{:?}", pool.stats());

    Ok(ExitCode::SUCCESS)
}
