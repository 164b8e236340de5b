use std::io;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, bounded, select};

use crate::manager::{ChunkManager, lock};

// Release builds keep the engine alive when a worker panics: the panic is logged and the
// worker stops. Debug builds let it unwind so the failure is loud.
#[cfg(not(debug_assertions))]
fn guarded(name: &str, body: impl FnOnce()) {
    if let Err(panic) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(body)) {
        let msg = panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        log::error!("{name} thread panicked: {msg}; worker stopped");
    }
}

#[cfg(debug_assertions)]
fn guarded(_name: &str, body: impl FnOnce()) {
    body();
}

impl ChunkManager {
    /// Starts the rebuild, update and water workers. Calling it while they run is a no-op.
    ///
    /// The workers keep the manager alive until [`Self::shutdown`] joins them.
    pub fn start_threads(self: &Arc<Self>) -> io::Result<()> {
        let mut workers = lock(&self.workers);
        if !workers.is_empty() {
            return Ok(());
        }
        self.exit.store(false, Ordering::Relaxed);
        let (stop_tx, stop_rx) = bounded::<()>(0);
        *lock(&self.stop) = Some(stop_tx);

        let spawn = |name: &str, body: fn(&ChunkManager, &Receiver<()>)| {
            let manager = Arc::clone(self);
            let stop = stop_rx.clone();
            let label = name.to_string();
            thread::Builder::new()
                .name(name.to_string())
                .spawn(move || guarded(&label, || body(&manager, &stop)))
        };
        workers.push(spawn("burrow-rebuild", rebuild_loop)?);
        workers.push(spawn("burrow-update", update_loop)?);
        workers.push(spawn("burrow-water", water_loop)?);
        log::info!("chunk workers started");
        Ok(())
    }

    /// Stops and joins the workers, then shuts down the light registry and mote noise.
    pub fn shutdown(&self) {
        self.exit.store(true, Ordering::Relaxed);
        lock(&self.stop).take();
        self.signal();
        let handles: Vec<_> = lock(&self.workers).drain(..).collect();
        for handle in handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                log::error!("{name} thread exited with a panic");
            }
        }
        self.light_registry().shutdown();
        self.motes().shutdown();
        let stats = self.stats();
        log::info!(
            "chunk manager shut down: {} rebuilds, {} update ticks, {} water steps",
            stats.rebuilds,
            stats.update_ticks,
            stats.water_steps
        );
    }

    pub fn threads_running(&self) -> bool {
        !lock(&self.workers).is_empty()
    }
}

fn rebuild_loop(manager: &ChunkManager, stop: &Receiver<()>) {
    loop {
        if manager.exit.load(Ordering::Relaxed) {
            break;
        }
        select! {
            recv(stop) -> _ => break,
            recv(manager.signal_rx) -> msg => if msg.is_err() { break },
        }
        if manager.exit.load(Ordering::Relaxed) {
            break;
        }
        let started = Instant::now();
        let rebuilt = manager.process_rebuild_queue();
        if rebuilt > 0 {
            log::debug!(
                target: "perf",
                "ms rebuild_queue={} chunks={}",
                started.elapsed().as_millis().min(u128::from(u32::MAX)) as u32,
                rebuilt
            );
        }
    }
}

fn update_loop(manager: &ChunkManager, stop: &Receiver<()>) {
    let interval = Duration::from_millis(manager.config.update_interval_ms);
    loop {
        if manager.exit.load(Ordering::Relaxed) {
            break;
        }
        select! {
            recv(stop) -> _ => break,
            default(interval) => {}
        }
        manager.update_next_chunk();
    }
}

fn water_loop(manager: &ChunkManager, stop: &Receiver<()>) {
    let min = Duration::from_millis(manager.config.water_min_interval_ms);
    let max = Duration::from_millis(manager.config.water_max_interval_ms);
    let mut interval = min;
    loop {
        if manager.exit.load(Ordering::Relaxed) {
            break;
        }
        select! {
            recv(stop) -> _ => break,
            default(interval) => {}
        }
        // Busy water ticks at the fastest rate; still water backs off.
        interval = if manager.step_water() > 0 {
            min
        } else {
            (interval * 2).min(max)
        };
    }
}
