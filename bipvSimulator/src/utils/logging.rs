use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;
use tracing_subscriber::{EnvFilter, prelude::*};
use tracing_timing::{Builder, Histogram};
use std::collections::HashMap;
use std::fmt;
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use std::cell::RefCell;

const HISTOGRAM_MAX_NS: u64 = 60_000_000_000;
const HISTOGRAM_SIGFIG: u8 = 3;

/// Pipeline stage a timed scope is reported under.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub enum OperationCategory {
    Simulation,
    Screening,
    PowerAggregation,
    LcaAccounting,
    FileIO {
        subcategory: FileIOType,
    },
}

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub enum FileIOType {
    DataLoad,
    CheckpointSave,
    CheckpointLoad,
    ResultsSave,
}

impl fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationCategory::Simulation => write!(f, "Simulation"),
            OperationCategory::Screening => write!(f, "Screening"),
            OperationCategory::PowerAggregation => write!(f, "Power Aggregation"),
            OperationCategory::LcaAccounting => write!(f, "LCA Accounting"),
            OperationCategory::FileIO { subcategory } => {
                let io = match subcategory {
                    FileIOType::DataLoad => "Data Load",
                    FileIOType::CheckpointSave => "Checkpoint Save",
                    FileIOType::CheckpointLoad => "Checkpoint Load",
                    FileIOType::ResultsSave => "Results Save",
                };
                write!(f, "File I/O - {}", io)
            }
        }
    }
}

struct ScopeTimings {
    total: Duration,
    count: usize,
    callers: Vec<String>,
    histogram: Option<Histogram<u64>>,
}

/// Durations of every timed scope, by scope name and by category.
#[derive(Default)]
struct TimingRegistry {
    scopes: HashMap<String, ScopeTimings>,
    categories: HashMap<OperationCategory, Histogram<u64>>,
}

impl TimingRegistry {
    fn record(&mut self, name: &str, caller: Option<&str>, category: OperationCategory, duration: Duration) {
        let duration_ns = (duration.as_nanos() as u64).clamp(1, HISTOGRAM_MAX_NS);

        let scope = self.scopes.entry(name.to_string()).or_insert_with(|| ScopeTimings {
            total: Duration::ZERO,
            count: 0,
            callers: Vec::new(),
            histogram: new_histogram(),
        });
        scope.total += duration;
        scope.count += 1;
        if let Some(caller) = caller {
            if !scope.callers.iter().any(|known| known == caller) {
                scope.callers.push(caller.to_string());
            }
        }
        if let Some(histogram) = scope.histogram.as_mut() {
            let _ = histogram.record(duration_ns);
        }

        if !self.categories.contains_key(&category) {
            if let Some(histogram) = new_histogram() {
                self.categories.insert(category, histogram);
            }
        }
        if let Some(histogram) = self.categories.get_mut(&category) {
            let _ = histogram.record(duration_ns);
        }
    }

    fn print_scopes(&self) {
        println!("\nHierarchical Timing Analysis:");
        println!("---------------------------");
        let mut scopes: Vec<_> = self.scopes.iter().collect();
        scopes.sort_by(|a, b| b.1.total.cmp(&a.1.total));

        for (name, scope) in scopes {
            let avg_ms = scope.total.as_secs_f64() * 1000.0 / scope.count.max(1) as f64;
            let p95_ms = scope
                .histogram
                .as_ref()
                .map(|histogram| histogram.value_at_quantile(0.95) as f64 / 1_000_000.0)
                .unwrap_or(0.0);
            println!(
                "{}: total={:.2}s, count={}, avg={:.2}ms, p95={:.2}ms",
                name,
                scope.total.as_secs_f64(),
                scope.count,
                avg_ms,
                p95_ms
            );
            if !scope.callers.is_empty() {
                println!("  Called by: {}", scope.callers.join(", "));
            }
        }
    }

    fn print_categories(&self) {
        println!("\nPerformance by Category:");
        println!("------------------------");
        let total_ns = |histogram: &Histogram<u64>| histogram.mean() * histogram.len() as f64;
        let mut categories: Vec<_> = self.categories.iter().collect();
        categories.sort_by(|a, b| total_ns(b.1).partial_cmp(&total_ns(a.1)).unwrap_or(std::cmp::Ordering::Equal));
        let total_time: f64 = categories.iter().map(|(_, histogram)| total_ns(histogram)).sum();

        for (category, histogram) in categories {
            let category_total = total_ns(histogram);
            let percentage = if total_time > 0.0 { category_total / total_time * 100.0 } else { 0.0 };
            println!(
                "{}: {:.1}% of total time\n  mean={:.2}ms, p95={:.2}ms, count={}, total={:.2}s",
                category,
                percentage,
                histogram.mean() / 1_000_000.0,
                histogram.value_at_quantile(0.95) as f64 / 1_000_000.0,
                histogram.len(),
                category_total / 1_000_000_000.0,
            );
        }
    }
}

thread_local! {
    // names of the scopes open on this thread, innermost last
    static OPEN_SCOPES: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

lazy_static! {
    static ref TIMING_ENABLED: AtomicBool = AtomicBool::new(false);
    static ref TIMINGS: RwLock<TimingRegistry> = RwLock::new(TimingRegistry::default());
}

/// Records the time spent in a scope when dropped.
pub struct TimingGuard {
    name: String,
    category: OperationCategory,
    start: Instant,
    tracked: bool,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if !self.tracked {
            return;
        }
        let duration = self.start.elapsed();
        let caller = OPEN_SCOPES.with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            scopes.pop();
            scopes.last().cloned()
        });
        TIMINGS.write().record(&self.name, caller.as_deref(), self.category, duration);
    }
}

pub fn start_timing(name: &str, category: OperationCategory) -> TimingGuard {
    let tracked = is_timing_enabled();
    if tracked {
        OPEN_SCOPES.with(|scopes| scopes.borrow_mut().push(name.to_string()));
    }
    TimingGuard {
        name: name.to_string(),
        category,
        start: Instant::now(),
        tracked,
    }
}

fn new_histogram() -> Option<Histogram<u64>> {
    Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_NS, HISTOGRAM_SIGFIG).ok()
}

/// Installs the global subscriber. User-facing messages use `target: "user"`,
/// detailed diagnostics `target: "dev"`.
pub fn init_logging(enable_timing: bool, debug_logging: bool) {
    TIMING_ENABLED.store(enable_timing, Ordering::SeqCst);

    let mut env_filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    if debug_logging {
        for directive in ["bipvsim=debug", "dev=debug"] {
            if let Ok(directive) = directive.parse() {
                env_filter = env_filter.add_directive(directive);
            }
        }
    }

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().pretty());

    if enable_timing {
        let histogram = || {
            Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_NS, HISTOGRAM_SIGFIG)
                .expect("histogram bounds are valid")
        };
        tracing::subscriber::set_global_default(registry.with(Builder::default().layer(histogram).boxed()))
            .expect("Failed to set up tracing subscriber");
    } else {
        tracing::subscriber::set_global_default(registry).expect("Failed to set up tracing subscriber");
    }
}

fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::SeqCst)
}

pub fn print_timing_report() {
    if !is_timing_enabled() {
        return;
    }

    println!("\nDetailed Performance Report");
    println!("==========================");
    let timings = TIMINGS.read();
    timings.print_scopes();
    timings.print_categories();
    println!("==========================\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_scopes_remember_their_caller() {
        let ms = Duration::from_millis;
        let mut registry = TimingRegistry::default();
        registry.record("simulate_building", None, OperationCategory::Simulation, ms(5));
        registry.record("fleet_run", Some("simulate_building"), OperationCategory::Simulation, ms(1));
        registry.record("fleet_run", Some("simulate_building"), OperationCategory::Simulation, ms(3));
        registry.record(
            "save_checkpoint",
            Some("simulate_building"),
            OperationCategory::FileIO { subcategory: FileIOType::CheckpointSave },
            ms(2),
        );

        let fleet_run = &registry.scopes["fleet_run"];
        assert_eq!(fleet_run.count, 2);
        assert_eq!(fleet_run.total, ms(4));
        assert_eq!(fleet_run.callers, vec!["simulate_building".to_string()]);
        assert!(registry.scopes["simulate_building"].callers.is_empty());
        assert_eq!(registry.categories[&OperationCategory::Simulation].len(), 3);
        assert_eq!(registry.categories.len(), 2);
    }

    #[test]
    fn categories_have_readable_names() {
        let category = OperationCategory::FileIO { subcategory: FileIOType::ResultsSave };
        assert_eq!(category.to_string(), "File I/O - Results Save");
    }
}
