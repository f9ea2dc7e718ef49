//! Lightweight timing of the ecosystem tick phases.
//!
//! Every ecosystem owns a profiler and times each phase of its tick. With
//! the `profile` feature enabled the experiment also logs a summary at
//! every sample interval:
//! ```bash
//! cargo run --release --features profile --example basic_demo
//! ```

use std::collections::HashMap;
use std::fmt::Write;
use std::time::{Duration, Instant};

/// Collects timing data for named sections and provides aggregated
/// statistics.
#[derive(Debug, Default)]
pub struct Profiler {
    sections: HashMap<&'static str, SectionStats>,
    current_section: Option<(&'static str, Instant)>,
    tick_count: u64,
}

#[derive(Debug, Default, Clone)]
pub struct SectionStats {
    pub total_time: Duration,
    pub call_count: u64,
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
}

impl SectionStats {
    pub fn avg_time(&self) -> Duration {
        if self.call_count == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.call_count as u32
        }
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing a section. Starting another one ends the current one.
    pub fn begin_section(&mut self, name: &'static str) {
        self.end_section();
        self.current_section = Some((name, Instant::now()));
    }

    pub fn end_section(&mut self) {
        if let Some((name, start)) = self.current_section.take() {
            let elapsed = start.elapsed();
            let stats = self.sections.entry(name).or_default();
            stats.total_time += elapsed;
            stats.call_count += 1;
            stats.min_time = Some(stats.min_time.map_or(elapsed, |m| m.min(elapsed)));
            stats.max_time = Some(stats.max_time.map_or(elapsed, |m| m.max(elapsed)));
        }
    }

    pub fn time_section<F, R>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.begin_section(name);
        let result = f();
        self.end_section();
        result
    }

    /// Close the current section and count a finished tick.
    pub fn tick(&mut self) {
        self.end_section();
        self.tick_count += 1;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn get_section(&self, name: &str) -> Option<&SectionStats> {
        self.sections.get(name)
    }

    pub fn section_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.sections.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Table of all sections, slowest first.
    pub fn summary(&self) -> String {
        let mut sections: Vec<_> = self.sections.iter().collect();
        sections.sort_by(|a, b| b.1.total_time.cmp(&a.1.total_time).then(a.0.cmp(b.0)));
        let total: Duration = sections.iter().map(|(_, s)| s.total_time).sum();

        let mut out = String::new();
        let _ = writeln!(out, "=== Profiler Summary ({} ticks) ===", self.tick_count);
        let _ = writeln!(
            out,
            "{:<12} {:>10} {:>10} {:>10} {:>10} {:>8}",
            "Phase", "Total", "Avg/tick", "Min", "Max", "% Time"
        );
        let _ = writeln!(out, "{}", "-".repeat(65));
        for (name, stats) in &sections {
            let avg_per_tick = if self.tick_count > 0 {
                stats.total_time / self.tick_count as u32
            } else {
                Duration::ZERO
            };
            let pct = if total.as_nanos() > 0 {
                stats.total_time.as_nanos() as f64 / total.as_nanos() as f64 * 100.0
            } else {
                0.0
            };
            let _ = writeln!(
                out,
                "{:<12} {:>10.2?} {:>10.2?} {:>10.2?} {:>10.2?} {:>7.1}%",
                name,
                stats.total_time,
                avg_per_tick,
                stats.min_time.unwrap_or(Duration::ZERO),
                stats.max_time.unwrap_or(Duration::ZERO),
                pct
            );
        }
        let _ = writeln!(out, "{}", "-".repeat(65));
        let _ = write!(out, "{:<12} {:>10.2?}", "TOTAL", total);
        out
    }

    pub fn reset(&mut self) {
        self.sections.clear();
        self.current_section = None;
        self.tick_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_profiler_basic() {
        let mut profiler = Profiler::new();

        profiler.time_section("physics", || {
            sleep(Duration::from_millis(10));
        });
        profiler.tick();

        let stats = profiler.get_section("physics").unwrap();
        assert!(stats.total_time >= Duration::from_millis(10));
        assert_eq!(stats.call_count, 1);
    }

    #[test]
    fn test_begin_section_closes_the_previous_one() {
        let mut profiler = Profiler::new();

        for _ in 0..5 {
            profiler.begin_section("eggs");
            sleep(Duration::from_millis(1));
            profiler.begin_section("physics");
            sleep(Duration::from_millis(5));
            profiler.tick();
        }

        assert_eq!(profiler.tick_count(), 5);
        assert_eq!(profiler.section_names(), vec!["eggs", "physics"]);

        let eggs = profiler.get_section("eggs").unwrap();
        let physics = profiler.get_section("physics").unwrap();
        assert_eq!(eggs.call_count, 5);
        assert_eq!(physics.call_count, 5);
        assert!(physics.total_time > eggs.total_time);
        assert!(profiler.summary().contains("physics"));
    }
}
