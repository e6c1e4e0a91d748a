//! Argument parsing and command execution for the `spellbee` binary.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use spellbee_replica::ReplicatedProfile;
use spellbee_storage::{LocalStore, MemoryKeyValueStore, SqliteKeyValueStore};
use spellbee_sync::cloud::{CloudReconciler, DirectoryCloudStore, RemoteReplicaAdapter};
use spellbee_sync::transport::memory::MemoryChannel;
use spellbee_sync::{
    CloudConfig, PeerChannel, SyncConfig, SyncEngine, SyncEvent, SyncStatus, create_orchestrator,
};
use spellbee_types::{DeviceId, ProfileRecord, Timestamp};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "spellbee")]
#[command(about = "Inspect and sync spelling-bee learner profiles")]
pub struct Args {
    /// Path to the profile database
    #[arg(short, long, default_value = "spellbee.db")]
    pub store: PathBuf,

    /// Device identifier to write replicas as (defaults to this machine)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the stored profile and sync bookkeeping
    Show,
    /// Create (or replace) the profile at the end of onboarding
    Create {
        name: String,
        #[arg(short, long, default_value_t = 1)]
        grade: i64,
    },
    /// Mark a level of the selected grade as completed
    CompleteLevel { level: u16 },
    /// Switch the selected grade
    SetGrade { grade: i64 },
    /// Delete the profile and all sync state
    Reset,
    /// Sync two in-memory devices and print what happens
    Simulate {
        /// Give the watch the newer copy instead of the phone
        #[arg(long)]
        watch_newer: bool,
    },
    /// Reconcile with a cloud container folder
    CloudSync {
        #[arg(long)]
        dir: PathBuf,
    },
}

/// Executes one command, writing its report to `out`.
pub async fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    match &args.command {
        Command::Simulate { watch_newer } => simulate(*watch_newer, out).await,
        Command::CloudSync { dir } => {
            let store = open_store(args)?;
            cloud_sync(&store, dir.clone(), out).await
        }
        command => {
            let store = open_store(args)?;
            run_local(&store, command, out)
        }
    }
}

fn open_store(args: &Args) -> Result<LocalStore> {
    let device = match &args.device {
        Some(id) => id.parse::<DeviceId>().context("Invalid device identifier")?,
        None => DeviceId::current(),
    };
    let kv = SqliteKeyValueStore::open(&args.store)
        .with_context(|| format!("Failed to open profile store at {:?}", args.store))?;
    debug!("Opened {:?} as device {}", args.store, device);
    Ok(LocalStore::new(Arc::new(kv), device))
}

fn run_local(store: &LocalStore, command: &Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Show => match store.load()? {
            Some(profile) => {
                print_profile(&profile, out)?;
                writeln!(out, "pending sync: {}", store.has_pending_sync()?)?;
                match store.last_sync()? {
                    Some(ts) => writeln!(out, "last sync: {ts}")?,
                    None => writeln!(out, "last sync: never")?,
                }
                if let Some(id) = store.remote_record_id()? {
                    writeln!(out, "cloud record: {id}")?;
                }
            }
            None => writeln!(out, "no profile")?,
        },
        Command::Create { name, grade } => {
            let profile = store.save_record(ProfileRecord::new(name.as_str(), *grade))?;
            print_profile(&profile, out)?;
        }
        Command::CompleteLevel { level } => {
            let mut record = require_record(store)?;
            if !record.is_level_unlocked(*level) {
                bail!("Level {level} is still locked");
            }
            if !record.complete_level(*level) {
                bail!("Level {level} is out of range");
            }
            print_profile(&store.save_record(record)?, out)?;
        }
        Command::SetGrade { grade } => {
            let mut record = require_record(store)?;
            record.set_grade(*grade);
            print_profile(&store.save_record(record)?, out)?;
        }
        Command::Reset => {
            store.reset()?;
            writeln!(out, "profile reset")?;
        }
        Command::Simulate { .. } | Command::CloudSync { .. } => {
            bail!("{command:?} is not a local command")
        }
    }
    Ok(())
}

fn require_record(store: &LocalStore) -> Result<ProfileRecord> {
    store
        .load_record()?
        .context("No profile yet, run `create` first")
}

fn print_profile(profile: &ReplicatedProfile, out: &mut impl Write) -> Result<()> {
    let record = profile.record();
    let grade = record.grade();
    let completed: Vec<String> = record
        .completed_levels(grade)
        .iter()
        .map(u16::to_string)
        .collect();
    writeln!(out, "name: {}", record.name())?;
    writeln!(out, "grade: {grade}")?;
    writeln!(out, "current level: {}", record.current_level(grade))?;
    writeln!(out, "completed: [{}]", completed.join(", "))?;
    writeln!(
        out,
        "last modified: {} by {} (schema {})",
        profile.last_modified(),
        profile.device_identifier(),
        profile.schema_version()
    )?;
    Ok(())
}

async fn cloud_sync(store: &LocalStore, dir: PathBuf, out: &mut impl Write) -> Result<()> {
    let config = CloudConfig {
        container_path: Some(dir),
        ..CloudConfig::default()
    };
    let adapter = RemoteReplicaAdapter::new(config.record_type.as_str());
    let cloud = Arc::new(DirectoryCloudStore::new(config));
    let reconciler = CloudReconciler::with_adapter(store.clone(), cloud, adapter);

    let outcome = reconciler
        .reconcile()
        .await
        .context("Cloud reconciliation failed")?;
    writeln!(out, "cloud sync: {outcome:?}")?;
    Ok(())
}

async fn simulate(watch_newer: bool, out: &mut impl Write) -> Result<()> {
    let (phone_end, watch_end) = MemoryChannel::pair("phone", "watch");
    let phone_store = LocalStore::new(Arc::new(MemoryKeyValueStore::new()), DeviceId::new("phone"));
    let watch_store = LocalStore::new(Arc::new(MemoryKeyValueStore::new()), DeviceId::new("watch"));

    let (older, newer) = (Timestamp::from_millis(1_000), Timestamp::now());
    let (phone_ts, watch_ts) = if watch_newer { (older, newer) } else { (newer, older) };
    phone_store.save(&sample_profile("Phone copy", phone_ts, "phone"))?;
    watch_store.save(&sample_profile("Watch copy", watch_ts, "watch"))?;

    let (phone, mut phone_events, phone_loop) = create_orchestrator(
        SyncEngine::new(phone_store.clone(), device_config("Phone")),
        Arc::new(phone_end) as Arc<dyn PeerChannel>,
    );
    let (watch, mut watch_events, watch_loop) = create_orchestrator(
        SyncEngine::new(watch_store.clone(), device_config("Watch")),
        Arc::new(watch_end) as Arc<dyn PeerChannel>,
    );
    let phone_task = tokio::spawn(phone_loop.run());
    let watch_task = tokio::spawn(watch_loop.run());

    info!("Watch activated, pulling from phone");
    watch.trigger_sync()?;
    let settled = tokio::time::timeout(
        Duration::from_secs(5),
        watch.wait_for_status(|s| !s.is_syncing() && *s != SyncStatus::Idle),
    )
    .await
    .context("Simulated sync did not finish")??;

    if watch_newer {
        // Push-back lands on the phone asynchronously.
        tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(event) = phone_events.recv().await {
                if matches!(event, SyncEvent::ProfileChanged(_)) {
                    break;
                }
            }
        })
        .await
        .context("Push-back did not reach the phone")?;
    }

    watch.shutdown()?;
    phone.shutdown()?;
    watch_task.await?;
    phone_task.await?;

    while let Ok(event) = watch_events.try_recv() {
        writeln!(out, "watch event: {}", describe(&event))?;
    }
    writeln!(out, "watch status: {settled}")?;
    for (name, store) in [("phone", &phone_store), ("watch", &watch_store)] {
        let holds = store
            .load_record()?
            .map(|r| r.name().to_string())
            .unwrap_or_else(|| "nothing".to_string());
        writeln!(out, "{name} holds: {holds}")?;
    }
    Ok(())
}

fn device_config(name: &str) -> SyncConfig {
    SyncConfig {
        device_name: name.to_string(),
        ..SyncConfig::default()
    }
}

fn sample_profile(name: &str, ts: Timestamp, device: &str) -> ReplicatedProfile {
    let mut record = ProfileRecord::new(name, 2);
    record.complete_level(1);
    ReplicatedProfile::with_timestamp(record, ts, DeviceId::new(device), 1)
}

fn describe(event: &SyncEvent) -> String {
    match event {
        SyncEvent::StatusChanged(status) => format!("status {status}"),
        SyncEvent::ProfileChanged(profile) => {
            format!("profile replaced by {}", profile.device_identifier())
        }
    }
}
