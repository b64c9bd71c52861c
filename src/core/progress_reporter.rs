use super::mc::Float;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Thread safe progress counter that logs at every tenth of the total work.
#[derive(Debug)]
pub struct ProgressReporter {
    total_work: u64,
    title: String,
    start_time: Instant,
    work_done: AtomicU64,
    last_decile: AtomicU64,
    quiet: bool
}

impl ProgressReporter {
    pub fn new(total_work: u64, title: &str, quiet: bool) -> ProgressReporter {
        ProgressReporter {
            total_work,
            title: String::from(title),
            start_time: Instant::now(),
            work_done: AtomicU64::new(0),
            last_decile: AtomicU64::new(0),
            quiet
        }
    }

    pub fn update(&self, num: u64) {
        if num == 0 || self.total_work == 0 {
            return;
        }
        let done = self.work_done.fetch_add(num, Ordering::SeqCst) + num;
        let decile = (done.min(self.total_work) * 10) / self.total_work;
        let mut last = self.last_decile.load(Ordering::SeqCst);
        while decile > last {
            match self.last_decile.compare_exchange_weak(last, decile, Ordering::SeqCst, Ordering::Relaxed) {
                Ok(_) => {
                    self.report(done);
                    break;
                }
                Err(x) => last = x
            }
        }
    }

    fn report(&self, done: u64) {
        if self.quiet {
            return;
        }
        let percent_done = done.min(self.total_work) as Float / self.total_work as Float;
        let seconds = self.elapsed_ms() as Float / 1000.0;
        let est_remaining = seconds / percent_done - seconds;
        if percent_done >= 1.0 {
            info!("{}: 100% ({:.1}s)", self.title, seconds);
        } else {
            info!("{}: {:.0}% ({:.1}s|{:.1}s)", self.title, percent_done * 100.0, seconds, est_remaining.max(0.0));
        }
    }

    pub fn work_done(&self) -> u64 {
        self.work_done.load(Ordering::SeqCst)
    }

    pub fn elapsed_ms(&self) -> u128 {
        (Instant::now() - self.start_time).as_millis()
    }
}
