//! # DDS Test Bench
//!
//! Host harness for the deadline-driven scheduler: wires up the kernel
//! adapter, the scheduler task, one generator and one user task per class,
//! and the monitor, then lets the system run for a couple of hyper-periods.
//!
//! Select a workload with `DDS_TEST_BENCH=1|2|3` (default 1); raise log
//! verbosity with `RUST_LOG` (`info` shows the event table).

mod monitor;
mod workload;

use std::env;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dds_hal::channel;
use dds_hal::clock::{Clock, HostClock};
use dds_hal::task::TaskRegistry;
use dds_hal::timer::PeriodicTimer;
use dds_hal::{HalResult, Priority};
use dds_sched::{
    ClassId, ReleaseGenerator, Scheduler, SchedulerClient, SchedulerConfig, TestBench,
};

use monitor::Monitor;
use workload::UserTask;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let bench = env::var("DDS_TEST_BENCH")
        .ok()
        .and_then(|value| value.parse().ok())
        .and_then(TestBench::from_index)
        .unwrap_or(TestBench::One);

    log::info!("[bench] running test bench {:?}", bench);
    if let Err(err) = run(bench.config()) {
        // Task or timer creation failures are fatal before scheduling starts.
        log::error!("[bench] startup failed: {:?}", err);
        std::process::exit(1);
    }
}

fn run(config: SchedulerConfig) -> HalResult<()> {
    let registry = Arc::new(TaskRegistry::new());
    let clock: Arc<dyn Clock> = Arc::new(HostClock::start(config.tick_rate()));
    let (req_tx, req_rx) = channel::bounded(config.queue_capacity);
    let (resp_tx, resp_rx) = channel::bounded(config.queue_capacity);
    let client = SchedulerClient::new(req_tx, resp_rx);

    // The scheduler task, above all user work.
    let mut scheduler = Scheduler::new(
        config.clone(),
        Arc::clone(&registry),
        Arc::clone(&clock),
        resp_tx,
    );
    registry.spawn("dd_scheduler", Priority::High, move |_me| {
        scheduler.run(req_rx)
    })?;

    // Per class: the user task executing instances, the generator releasing
    // them, and the timer pacing the generator.
    let mut timers = Vec::new();
    for class_number in 1..=config.class_count() as u16 {
        let class = ClassId::new(class_number);

        // The user task handle is registered first so the generator can
        // name it in every release; its thread attaches afterwards.
        let user = registry.register(format!("usr_d{}", class_number), Priority::Low);
        registry.suspend(user)?;
        let workload = match UserTask::new(class, client.clone(), Arc::clone(&clock), &config) {
            Some(workload) => workload,
            None => continue,
        };
        let user_registry = Arc::clone(&registry);
        registry.attach(user, move |me| workload.run(user_registry, me))?;

        // Generators start suspended; their class timer paces every release.
        let generator = ReleaseGenerator::new(class, user, client.clone());
        let generator_handle =
            registry.register(format!("dd_gen{}", class_number), Priority::Med);
        registry.suspend(generator_handle)?;
        let generator_registry = Arc::clone(&registry);
        registry.attach(generator_handle, move |me| {
            generator.run(generator_registry, me)
        })?;

        let period = config
            .period(class)
            .unwrap_or(Duration::from_millis(100));
        let timer_registry = Arc::clone(&registry);
        timers.push(PeriodicTimer::start(
            &format!("timer{}", class_number),
            period,
            move || {
                let _ = timer_registry.resume(generator_handle);
            },
        )?);
    }

    // The monitor, timer-paced like the generators.
    let monitor = Monitor::new(client.clone());
    let monitor_registry = Arc::clone(&registry);
    let monitor_handle = registry.spawn("monitor", Priority::Med, move |me| {
        monitor.run(monitor_registry, me)
    })?;
    let timer_registry = Arc::clone(&registry);
    timers.push(PeriodicTimer::start(
        "monitor",
        config.monitor_period(),
        move || {
            let _ = timer_registry.resume(monitor_handle);
        },
    )?);

    // Let the workload run a couple of hyper-periods, then report and stop.
    let horizon = Duration::from_millis(2 * config.hyper_period_ms as u64 + 500);
    thread::sleep(horizon);
    for timer in &mut timers {
        timer.stop();
    }

    let summary = Monitor::new(client);
    if summary.report().is_err() {
        log::warn!("[bench] final report unavailable");
    }
    Ok(())
}
