//! End-to-end tests: the full protocol over real channels with the
//! scheduler loop running on its own thread.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dds_hal::channel;
use dds_hal::clock::{Clock, HostClock, ManualClock, Tick};
use dds_hal::task::TaskRegistry;
use dds_hal::Priority;
use dds_sched::{
    ClassId, ReleaseGenerator, ReleaseKind, ReleaseRequest, Scheduler, SchedulerClient,
    SchedulerConfig, TaskId, TestBench,
};

struct Harness {
    client: SchedulerClient,
    registry: Arc<TaskRegistry>,
    scheduler: thread::JoinHandle<()>,
}

fn start(config: SchedulerConfig, clock: Arc<dyn Clock>) -> Harness {
    let registry = Arc::new(TaskRegistry::new());
    let (req_tx, req_rx) = channel::bounded(config.queue_capacity);
    let (resp_tx, resp_rx) = channel::bounded(config.queue_capacity);

    let mut scheduler = Scheduler::new(config, Arc::clone(&registry), clock, resp_tx);
    let scheduler = thread::spawn(move || scheduler.run(req_rx));

    Harness {
        client: SchedulerClient::new(req_tx, resp_rx),
        registry,
        scheduler,
    }
}

#[test]
fn protocol_round_trip() {
    let clock = Arc::new(ManualClock::new());
    let harness = start(TestBench::One.config(), Arc::clone(&clock) as Arc<dyn Clock>);
    let client = harness.client.clone();

    let worker = harness.registry.register("usr_d1", Priority::Low);
    client
        .release(ReleaseRequest {
            handle: worker,
            id: TaskId::new(1001),
            class: ClassId::new(1),
            kind: ReleaseKind::Periodic,
        })
        .unwrap();

    // The query is processed after the release, so the snapshot is stable.
    let active = client.get_active().unwrap();
    assert_eq!(active.len(), 1);
    let head = active.front().unwrap();
    assert_eq!(head.id, TaskId::new(1001));
    assert_eq!(head.release_time, Tick::ZERO);
    assert_eq!(head.absolute_deadline, Tick::new(500));
    assert_eq!(harness.registry.priority(worker), Ok(Priority::Med));

    clock.set(Tick::new(95));
    client.complete(TaskId::new(1001)).unwrap();

    let active = client.get_active().unwrap();
    let completed = client.get_completed().unwrap();
    let overdue = client.get_overdue().unwrap();
    assert!(active.is_empty());
    assert_eq!(completed.len(), 1);
    assert!(overdue.is_empty());
    assert_eq!(
        completed.front().unwrap().completion_time,
        Some(Tick::new(95))
    );

    // Dropping every sender shuts the loop down.
    drop(client);
    drop(harness.client);
    harness.scheduler.join().unwrap();
}

#[test]
fn straggler_complete_lands_in_overdue() {
    let clock = Arc::new(ManualClock::new());
    let harness = start(TestBench::One.config(), Arc::clone(&clock) as Arc<dyn Clock>);
    let client = harness.client.clone();

    let worker = harness.registry.register("usr_d3", Priority::Low);
    client
        .release(ReleaseRequest {
            handle: worker,
            id: TaskId::new(3001),
            class: ClassId::new(3),
            kind: ReleaseKind::Periodic,
        })
        .unwrap();

    clock.set(Tick::new(751));
    // Any message past the deadline triggers the sweep; the straggling
    // complete then finds nothing to complete.
    client.complete(TaskId::new(3001)).unwrap();

    let overdue = client.get_overdue().unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue.front().unwrap().completion_time, None);
    assert!(client.get_completed().unwrap().is_empty());

    drop(client);
    drop(harness.client);
    harness.scheduler.join().unwrap();
}

#[test]
fn back_to_back_queries_are_identical() {
    let clock = Arc::new(ManualClock::new());
    let harness = start(TestBench::One.config(), Arc::clone(&clock) as Arc<dyn Clock>);
    let client = harness.client.clone();

    for (class, id) in [(2u16, 2001u32), (3, 3001)] {
        let worker = harness.registry.register("worker", Priority::Low);
        client
            .release(ReleaseRequest {
                handle: worker,
                id: TaskId::new(id),
                class: ClassId::new(class),
                kind: ReleaseKind::Periodic,
            })
            .unwrap();
    }

    let first = client.get_active().unwrap();
    let second = client.get_active().unwrap();
    assert_eq!(first, second);

    drop(client);
    drop(harness.client);
    harness.scheduler.join().unwrap();
}

/// Bench 1 over one hyper-period with live timers: classes 1/2/3 release at
/// least 3/3/2 instances across [0, 1500] ms.
#[test]
fn periodic_releases_over_one_hyper_period() {
    let config = TestBench::One.config();
    let clock = Arc::new(HostClock::start(config.tick_rate()));
    let registry = Arc::new(TaskRegistry::new());
    let (req_tx, req_rx) = channel::bounded(config.queue_capacity);
    let (resp_tx, resp_rx) = channel::bounded(config.queue_capacity);

    let mut scheduler = Scheduler::new(
        config.clone(),
        Arc::clone(&registry),
        Arc::clone(&clock) as Arc<dyn Clock>,
        resp_tx,
    );
    thread::spawn(move || scheduler.run(req_rx));
    let client = SchedulerClient::new(req_tx.clone(), resp_rx);

    let mut timers = Vec::new();
    for class in 1..=3u16 {
        let class = ClassId::new(class);
        let worker = registry.register(format!("usr_d{}", class.as_u16()), Priority::Low);
        let generator = ReleaseGenerator::new(class, worker, client.clone());

        let gen_handle = registry.register(format!("dd_gen{}", class.as_u16()), Priority::Med);
        registry.suspend(gen_handle).unwrap();
        let gen_registry = Arc::clone(&registry);
        registry
            .attach(gen_handle, move |me| generator.run(gen_registry, me))
            .unwrap();

        let period = config.period(class).unwrap();
        let timer_registry = Arc::clone(&registry);
        timers.push(
            dds_hal::timer::PeriodicTimer::start(
                &format!("timer{}", class.as_u16()),
                period,
                move || {
                    let _ = timer_registry.resume(gen_handle);
                },
            )
            .unwrap(),
        );
    }

    // One hyper-period plus slack for thread scheduling jitter.
    thread::sleep(Duration::from_millis(1700));
    for timer in &mut timers {
        timer.stop();
    }

    // Nothing completes in this test, so every released instance is in
    // Active or was swept to Overdue.
    let mut released = [0u32; 3];
    for list in [client.get_active().unwrap(), client.get_overdue().unwrap()] {
        for task in &list {
            released[task.class.as_u16() as usize - 1] += 1;
        }
    }
    assert!(released[0] >= 3, "class 1 released {} times", released[0]);
    assert!(released[1] >= 3, "class 2 released {} times", released[1]);
    assert!(released[2] >= 2, "class 3 released {} times", released[2]);
}
