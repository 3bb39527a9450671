//! Point-in-time diagnostic views of the pool.

use std::fmt;
use std::time::Duration;

use vitrine_types::{ComponentKind, InstanceId};

/// Aggregate counts for the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Maximum number of simultaneously leased instances.
    pub capacity: usize,
    /// Instances ever built and still tracked.
    pub tracked: usize,
    /// Instances currently checked out.
    pub leased: usize,
    /// Instances available for reuse.
    pub idle: usize,
    /// Free capacity permits.
    pub available_permits: usize,
}

/// Diagnostic record for one tracked instance.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    /// Stable identity assigned at build time.
    pub id: InstanceId,
    /// Kind the instance was registered under.
    pub kind: ComponentKind,
    /// `true` while checked out.
    pub leased: bool,
    /// Whether the instance exposes the engine capability.
    pub engine: bool,
    /// Whether the instance exposes the scripted-model capability.
    pub scripted: bool,
    /// Live showing flag, present only for engines.
    pub showing: Option<bool>,
    /// Times this instance has been checked out.
    pub lease_count: u64,
    /// Time since the instance was built.
    pub age: Duration,
}

/// Full diagnostic view: aggregate status plus one record per instance,
/// in creation order.
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    /// Aggregate counts at capture time.
    pub status: PoolStatus,
    /// Per-instance records, oldest first.
    pub instances: Vec<InstanceInfo>,
}

impl InstanceInfo {
    fn capability_tag(&self) -> &'static str {
        match (self.engine, self.scripted) {
            (true, true) => "engine+script",
            (true, false) => "engine",
            (false, true) => "script",
            (false, false) => "-",
        }
    }
}

impl fmt::Display for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "pool: {}/{} leased, {} tracked, {} permits free",
            self.status.leased,
            self.status.capacity,
            self.status.tracked,
            self.status.available_permits,
        )?;
        for info in &self.instances {
            let state = if info.leased { "leased" } else { "idle" };
            let showing = match info.showing {
                Some(true) => "showing",
                Some(false) => "hidden",
                None => "-",
            };
            writeln!(
                f,
                "  {:>6}  {:<24}  {:<6}  {:<13}  {:<7}  leases={:<3}  age={}s",
                info.id.to_string(),
                info.kind.as_str(),
                state,
                info.capability_tag(),
                showing,
                info.lease_count,
                info.age.as_secs(),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info(id: u64, leased: bool) -> InstanceInfo {
        InstanceInfo {
            id: InstanceId::new(id),
            kind: ComponentKind::new("org.demo.Engine").expect("kind"),
            leased,
            engine: true,
            scripted: false,
            showing: Some(false),
            lease_count: 3,
            age: Duration::from_secs(42),
        }
    }

    #[test]
    fn display_includes_header_counts() {
        let snapshot = PoolSnapshot {
            status: PoolStatus {
                capacity: 4,
                tracked: 2,
                leased: 1,
                idle: 1,
                available_permits: 3,
            },
            instances: vec![sample_info(1, true), sample_info(2, false)],
        };
        let rendered = snapshot.to_string();
        assert!(rendered.starts_with("pool: 1/4 leased, 2 tracked, 3 permits free"));
        assert!(rendered.contains("#1"));
        assert!(rendered.contains("leased"));
        assert!(rendered.contains("idle"));
    }

    #[test]
    fn capability_tags() {
        let mut info = sample_info(1, false);
        assert_eq!(info.capability_tag(), "engine");
        info.scripted = true;
        assert_eq!(info.capability_tag(), "engine+script");
        info.engine = false;
        assert_eq!(info.capability_tag(), "script");
        info.scripted = false;
        assert_eq!(info.capability_tag(), "-");
    }

    #[test]
    fn empty_snapshot_renders_header_only() {
        let snapshot = PoolSnapshot {
            status: PoolStatus {
                capacity: 4,
                tracked: 0,
                leased: 0,
                idle: 0,
                available_permits: 4,
            },
            instances: Vec::new(),
        };
        assert_eq!(snapshot.to_string().lines().count(), 1);
    }
}
