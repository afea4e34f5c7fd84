//! End-to-end fleet scenarios on real marker and log files

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use tempfile::{tempdir, TempDir};

use imapsync_status::app::UserSpec;
use imapsync_status::jobs::{JobRegistry, JobState};
use imapsync_status::progress::{Aggregator, FleetSnapshot, SampleMap};

struct Fleet {
    dir: TempDir,
    registry: JobRegistry,
    aggregator: Aggregator,
}

impl Fleet {
    fn new(users: &[&str]) -> Self {
        let dir = tempdir().unwrap();
        let users: BTreeMap<String, UserSpec> = users
            .iter()
            .map(|u| (u.to_string(), UserSpec::new(*u, format!("{}@new.example", u))))
            .collect();
        let registry = JobRegistry::new(dir.path(), users.clone());
        let aggregator = Aggregator::new(users.len());
        Self {
            dir,
            registry,
            aggregator,
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn start(&self, user: &str) {
        std::fs::write(
            self.path().join(format!("imapsync-{}.pid", user)),
            format!("4242\nLOG_imapsync/{}.txt\n", user),
        )
        .unwrap();
    }

    fn stop(&self, user: &str) {
        std::fs::remove_file(self.path().join(format!("imapsync-{}.pid", user))).unwrap();
    }

    fn log(&self, user: &str, line: &str) {
        let log_dir = self.path().join("LOG_imapsync");
        std::fs::create_dir_all(&log_dir).unwrap();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join(format!("{}.txt", user)))
            .unwrap();
        writeln!(file, "{}", line).unwrap();
    }

    fn remove_log(&self, user: &str) {
        std::fs::remove_file(self.path().join("LOG_imapsync").join(format!("{}.txt", user))).unwrap();
    }

    fn tick(&self, previous: &SampleMap) -> (FleetSnapshot, SampleMap) {
        let jobs = self.registry.discover().unwrap();
        self.aggregator.tick(&jobs, previous)
    }
}

#[test]
fn no_markers_means_everyone_idle() {
    let fleet = Fleet::new(&["alice", "bob"]);
    let (snapshot, samples) = fleet.tick(&SampleMap::new());

    assert_eq!(snapshot.total_users, 2);
    assert_eq!(snapshot.running_jobs, 0);
    assert_eq!(snapshot.idle_users, 2);
    assert_eq!(snapshot.max_eta, None);
    assert!(samples.is_empty());
}

#[test]
fn syncing_line_with_eta() {
    let fleet = Fleet::new(&["alice", "bob"]);
    fleet.start("alice");
    fleet.log("alice", "Host1: connected");
    fleet.log("alice", "12:00:01 ETA: Mon 2024-01-01 10:00:00 +0000  30/100 msgs left");

    let (snapshot, samples) = fleet.tick(&SampleMap::new());
    let alice = &samples["alice"];

    assert_eq!(snapshot.job_state("alice"), JobState::Syncing);
    assert_eq!(alice.transferred, 70);
    assert_eq!(alice.total, 100);
    assert!((alice.percent - 70.0).abs() < 1e-9);
    let eta = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0);
    assert_eq!(alice.eta, eta);
    assert_eq!(snapshot.max_eta, eta);
    assert_eq!(snapshot.running_jobs, 1);
    assert_eq!(snapshot.idle_users, 1);
}

#[test]
fn missing_log_keeps_previous_sample() {
    let fleet = Fleet::new(&["alice", "bob"]);
    fleet.start("alice");
    fleet.log("alice", "ETA: 2024-01-01 10:00:00 30/100 msgs left");
    let (first, previous) = fleet.tick(&SampleMap::new());

    fleet.remove_log("alice");
    let (second, samples) = fleet.tick(&previous);

    assert_eq!(samples["alice"], previous["alice"]);
    assert_eq!(second.running_jobs, first.running_jobs);
    assert_eq!(second.overall_transferred, 70);
}

#[test]
fn malformed_counts_keep_previous_sample() {
    let fleet = Fleet::new(&["alice"]);
    fleet.start("alice");
    fleet.log("alice", "40/100 msgs left");
    let (_, previous) = fleet.tick(&SampleMap::new());

    fleet.log("alice", "4x/100 msgs left");
    let (snapshot, samples) = fleet.tick(&previous);

    assert_eq!(samples, previous);
    assert_eq!(snapshot.overall_transferred, 60);
}

#[test]
fn marker_removal_reverts_to_idle() {
    let fleet = Fleet::new(&["alice", "bob"]);
    fleet.start("alice");
    fleet.start("bob");
    fleet.log("alice", "30/100 msgs left");
    fleet.log("bob", "10/50 msgs left");
    let (before, previous) = fleet.tick(&SampleMap::new());
    assert_eq!(before.running_jobs, 2);
    assert_eq!(before.overall_total, 150);

    fleet.stop("alice");
    let (after, samples) = fleet.tick(&previous);

    assert_eq!(after.job_state("alice"), JobState::Idle);
    assert_eq!(after.running_jobs, 1);
    assert_eq!(after.idle_users, 1);
    assert_eq!(after.overall_total, 50);
    assert_eq!(after.overall_transferred, 40);
    assert!(!samples.contains_key("alice"));
}

#[test]
fn tick_is_idempotent() {
    let fleet = Fleet::new(&["alice", "bob"]);
    fleet.start("alice");
    fleet.start("bob");
    fleet.log("alice", "ETA: 2024-01-01 10:00:00 3/9 msgs left");
    fleet.log("bob", "connecting");

    let (first, samples) = fleet.tick(&SampleMap::new());
    let (second, _) = fleet.tick(&SampleMap::new());
    let (third, _) = fleet.tick(&samples);

    assert_eq!(first, second);
    assert_eq!(first, third);
}

#[test]
fn transferred_grows_as_log_is_appended() {
    let fleet = Fleet::new(&["alice"]);
    fleet.start("alice");

    let mut previous = SampleMap::new();
    let mut last_transferred = 0;
    for remaining in [100, 80, 80, 55, 20, 0] {
        fleet.log("alice", &format!("ETA: 2024-01-01 10:00:00 {}/100 msgs left", remaining));
        let (snapshot, samples) = fleet.tick(&previous);

        assert!(snapshot.overall_transferred >= last_transferred);
        assert!(snapshot.overall_transferred <= snapshot.overall_total);
        last_transferred = snapshot.overall_transferred;
        previous = samples;
    }
    assert_eq!(last_transferred, 100);
}

#[test]
fn unknown_and_half_written_markers_are_ignored() {
    let fleet = Fleet::new(&["alice"]);
    fleet.start("mallory");
    fleet.log("mallory", "1/2 msgs left");
    std::fs::write(fleet.path().join("imapsync-alice.pid"), "4242\n").unwrap();

    let (snapshot, samples) = fleet.tick(&SampleMap::new());
    assert_eq!(snapshot, FleetSnapshot::idle(1));
    assert!(samples.is_empty());
}

#[test]
fn empty_mailbox_counts_as_zero_percent() {
    let fleet = Fleet::new(&["alice", "bob"]);
    fleet.start("alice");
    fleet.start("bob");
    fleet.log("alice", "0/0 msgs left");
    fleet.log("bob", "0/0 msgs left");

    let (snapshot, samples) = fleet.tick(&SampleMap::new());
    assert_eq!(snapshot.running_jobs, 2);
    assert_eq!(snapshot.overall_total, 0);
    assert_eq!(snapshot.overall_percent(), 0.0);
    assert!(samples.values().all(|s| s.percent == 0.0));
}

#[test]
fn informational_line_keeps_last_counts() {
    let fleet = Fleet::new(&["alice"]);
    fleet.start("alice");
    fleet.log("alice", "ETA: 2024-01-01 10:00:00 30/100 msgs left");
    let (_, previous) = fleet.tick(&SampleMap::new());

    fleet.log("alice", "Host1: folder [INBOX/Sent] selected");
    let (snapshot, samples) = fleet.tick(&previous);

    assert_eq!(samples, previous);
    assert_eq!(snapshot.job_state("alice"), JobState::Syncing);
    assert_eq!(snapshot.running_jobs, 1);
    assert_eq!(snapshot.overall_transferred, 70);
    assert_eq!(snapshot.overall_total, 100);
}
